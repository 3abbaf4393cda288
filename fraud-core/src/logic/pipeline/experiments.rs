//! Preset Experiments
//!
//! Trains every named preset on one shared split, one tracked run each,
//! and reports the best by F1.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::context::PipelineContext;
use super::steps::{evaluate_step, log_split_params, prepare, save_step, train_step};
use super::{SaveOutcome, TrainingSettings};
use crate::logic::config::{ProjectConfig, EXPERIMENT_PRESETS};
use crate::logic::data::{load_raw_data, split_features_target};
use crate::logic::error::{CoreError, CoreResult};
use crate::logic::model::ClassificationMetrics;
use crate::logic::tracking::{ExperimentTracker, RunId};

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentResult {
    pub preset: String,
    pub run_id: Option<RunId>,
    pub metrics: ClassificationMetrics,
    pub outcome: SaveOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub results: Vec<ExperimentResult>,
    /// Preset with the highest F1 (first wins ties)
    pub best: String,
}

impl ExperimentSummary {
    pub fn best_result(&self) -> Option<&ExperimentResult> {
        self.results.iter().find(|r| r.preset == self.best)
    }
}

/// Train `baseline`, `variation_1` and `variation_2`
pub fn run_experiments(
    config: &ProjectConfig,
    tracker: &dyn ExperimentTracker,
) -> CoreResult<ExperimentSummary> {
    run_presets(config, &EXPERIMENT_PRESETS, tracker)
}

/// Train each preset in `presets` on the same split
pub fn run_presets(
    config: &ProjectConfig,
    presets: &[&str],
    tracker: &dyn ExperimentTracker,
) -> CoreResult<ExperimentSummary> {
    // Resolve every preset up front so a typo fails before any training
    let settings: Vec<(String, TrainingSettings)> = presets
        .iter()
        .map(|&name| Ok((name.to_string(), TrainingSettings::from_config(config, name)?)))
        .collect::<CoreResult<_>>()?;
    let Some((_, first)) = settings.first() else {
        return Err(CoreError::InvalidValue("no presets to run".to_string()));
    };

    let raw = load_raw_data(&first.data_path)?;
    let (x, y) = split_features_target(&raw, &first.target_column, &config.drop_columns())?;
    let prepared = prepare(&x, &y, first)?;

    let mut results = Vec::with_capacity(settings.len());
    for (preset, mut run_settings) in settings {
        log::info!("==== Experiment: {} ====", preset);
        run_settings.model_name = format!("{}_{}", run_settings.model_name, preset);

        let mut ctx = PipelineContext::start(tracker, &preset);
        log_split_params(&ctx, &prepared.split);

        let run = (|| -> CoreResult<(ClassificationMetrics, SaveOutcome)> {
            let model = train_step(&mut ctx, &prepared.split, &run_settings.params)?;
            let metrics = evaluate_step(&mut ctx, &model, &prepared.split)?;

            let importance = model.feature_importance(&prepared.split.x_train.names)?;
            let csv_path = importance_csv_path(&config.tracking.dir, &preset);
            match write_importance_csv(&csv_path, &importance) {
                Ok(()) => ctx.log_artifact(&csv_path),
                Err(e) => log::warn!("Could not write {}: {}", csv_path.display(), e),
            }

            let outcome = save_step(
                &mut ctx,
                &model,
                prepared.scaler.as_ref(),
                metrics.f1_score,
                &run_settings,
            )?;
            Ok((metrics, outcome))
        })();

        let (run_id, _) = ctx.finish();
        let (metrics, outcome) = run?;
        log::info!("{} F1: {:.4}", preset, metrics.f1_score);

        results.push(ExperimentResult {
            preset,
            run_id,
            metrics,
            outcome,
        });
    }

    let best = best_by_f1(&results).to_string();
    log::info!("Best model: {}", best);
    Ok(ExperimentSummary { results, best })
}

fn best_by_f1(results: &[ExperimentResult]) -> &str {
    let mut best = &results[0];
    for r in &results[1..] {
        if r.metrics.f1_score > best.metrics.f1_score {
            best = r;
        }
    }
    &best.preset
}

/// (feature, importance) table as CSV
pub fn write_importance_csv(path: &Path, table: &[(String, f64)]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["feature", "importance"])?;
    for (name, value) in table {
        let value = value.to_string();
        writer.write_record([name.as_str(), value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Location of a preset's importance table under `dir`
pub fn importance_csv_path(dir: &Path, preset: &str) -> PathBuf {
    dir.join(format!("{}_feature_importance.csv", preset))
}
