use std::collections::BTreeMap;
use std::path::Path;

use tempfile::TempDir;

use super::*;
use crate::logic::config::ProjectConfig;
use crate::logic::error::CoreError;
use crate::logic::model::FraudDetectionModel;
use crate::logic::test_support::{synthetic, synthetic_csv};
use crate::logic::tracking::{MemoryTracker, RunStatus, TrackingEvent};

/// Config pointing at a synthetic CSV inside `dir`, with small presets
fn config_in(dir: &Path) -> ProjectConfig {
    let data_path = dir.join("creditcard.csv");
    std::fs::write(&data_path, synthetic_csv(400, 40, 6, 21)).unwrap();

    let mut config = ProjectConfig::default();
    config.data.raw_path = data_path;
    config.training.model_dir = dir.join("models");
    config.tracking.dir = dir.join("experiments");
    config.models = BTreeMap::from([
        ("baseline".to_string(), ForestParams::new(12, Some(6))),
        ("variation_1".to_string(), ForestParams::new(6, Some(3))),
        ("variation_2".to_string(), ForestParams::new(20, Some(8))),
    ]);
    config
}

struct FailingTracker;

impl ExperimentTracker for FailingTracker {
    fn experiment(&self) -> &str {
        "broken"
    }

    fn record(&self, _event: TrackingEvent) -> CoreResult<()> {
        Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "tracking backend down",
        )))
    }
}

fn saved_models(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".model"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_should_persist_threshold() {
    assert!(should_persist(0.95, 0.80));
    assert!(should_persist(0.80, 0.80));
    assert!(!should_persist(0.50, 0.80));
}

#[test]
fn test_artifact_path_format() {
    let path = artifact_path(Path::new("models"), "fraud_model");
    let name = path.file_name().unwrap().to_string_lossy().to_string();

    // fraud_model_YYYYmmdd_HHMMSS.model
    assert!(name.starts_with("fraud_model_"));
    assert!(name.ends_with(".model"));
    assert_eq!(name.len(), "fraud_model_".len() + 15 + ".model".len());
}

#[test]
fn test_save_step_respects_threshold() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let settings = TrainingSettings::from_config(&config, "baseline").unwrap();

    let (x, y) = synthetic(100, 10, 3, 2);
    let mut model = FraudDetectionModel::new(ForestParams::new(5, Some(3)));
    model.train(&x, &y).unwrap();

    let tracker = MemoryTracker::new("exp");
    let mut ctx = PipelineContext::start(&tracker, "save");

    let low = steps::save_step(&mut ctx, &model, None, 0.50, &settings).unwrap();
    assert_eq!(
        low,
        SaveOutcome::NotSaved {
            f1: 0.50,
            threshold: 0.80
        }
    );
    assert!(saved_models(&settings.model_dir).is_empty());

    let high = steps::save_step(&mut ctx, &model, None, 0.95, &settings).unwrap();
    let path = high.path().expect("artifact persisted");
    assert!(path.exists());
    assert_eq!(saved_models(&settings.model_dir).len(), 1);
    assert!(FraudDetectionModel::load(path).is_ok());
}

#[test]
fn test_run_training_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let settings = TrainingSettings::from_config(&config, "baseline").unwrap();
    let tracker = MemoryTracker::new("fraud-detection");

    let report = run_training(&settings, &tracker, "baseline").unwrap();

    let names: Vec<&str> = report.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["load_data", "preprocess", "train", "evaluate", "save_model"]
    );
    assert!(report.stages.iter().all(|s| s.succeeded));
    assert_eq!(report.feature_importance.len(), 6);
    assert!(report.metrics.f1_score > 0.8, "f1 = {}", report.metrics.f1_score);
    assert!(report.outcome.path().is_some());

    let run = report.run_id.unwrap();
    let metrics = tracker.metrics(&run);
    assert!(metrics.contains_key("f1_score"));
    assert!(metrics.contains_key("stage.train.duration_ms"));
    let params = tracker.params(&run);
    assert_eq!(params["n_estimators"], serde_json::json!(12));
    assert_eq!(params["n_features"], serde_json::json!(6));
    assert_eq!(tracker.status(&run), Some(RunStatus::Finished));
}

#[test]
fn test_run_training_with_scaling_and_resampling() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.training.scale = true;
    config.training.resampling = Resampling::Undersample;
    config.training.save_threshold = 0.0;
    let settings = TrainingSettings::from_config(&config, "baseline").unwrap();

    let report = run_training(&settings, &crate::logic::tracking::NoopTracker, "scaled").unwrap();

    let path = report.outcome.path().unwrap();
    assert!(crate::logic::data::scaler_path(path).exists());
}

#[test]
fn test_stage_failure_is_fatal_and_recorded() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.data.raw_path = dir.path().join("missing.csv");
    let settings = TrainingSettings::from_config(&config, "baseline").unwrap();
    let tracker = MemoryTracker::new("exp");

    let err = run_training(&settings, &tracker, "broken").unwrap_err();
    assert!(matches!(err, CoreError::Io(_)));

    let run = tracker.runs().pop().unwrap();
    assert_eq!(tracker.status(&run), Some(RunStatus::Failed));
}

#[test]
fn test_tracker_failures_do_not_propagate() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let settings = TrainingSettings::from_config(&config, "variation_1").unwrap();

    let report = run_training(&settings, &FailingTracker, "untracked").unwrap();
    assert!(report.run_id.is_none());
    assert_eq!(report.stages.len(), 5);
}

#[test]
fn test_unknown_preset_rejected() {
    let config = ProjectConfig::default();
    assert!(matches!(
        TrainingSettings::from_config(&config, "variation_9"),
        Err(CoreError::UnknownPreset(_))
    ));
}

#[test]
fn test_run_experiments_reports_best() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let tracker = MemoryTracker::new("fraud-detection");

    let summary = run_experiments(&config, &tracker).unwrap();

    let presets: Vec<&str> = summary.results.iter().map(|r| r.preset.as_str()).collect();
    assert_eq!(presets, vec!["baseline", "variation_1", "variation_2"]);
    assert_eq!(tracker.runs().len(), 3);

    let best = summary.best_result().unwrap();
    assert!(summary
        .results
        .iter()
        .all(|r| r.metrics.f1_score <= best.metrics.f1_score));

    for r in &summary.results {
        let path = experiments::importance_csv_path(&config.tracking.dir, &r.preset);
        assert!(path.exists(), "{}", path.display());
    }
}
