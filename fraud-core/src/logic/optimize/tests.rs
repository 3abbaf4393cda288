use tempfile::TempDir;

use super::*;
use crate::logic::config::ProjectConfig;
use crate::logic::data::scaler_path;
use crate::logic::pipeline::prepare;
use crate::logic::error::CoreError;
use crate::logic::test_support::synthetic;
use crate::logic::tracking::MemoryTracker;

fn small_space() -> SearchSpace {
    SearchSpace {
        n_estimators: IntRange::new(5, 10, 5),
        max_depth: IntRange::new(3, 6, 3),
        ..Default::default()
    }
}

#[test]
fn test_best_trial_first_wins_ties() {
    let mut study = Study::new(StudyConfig::default().with_n_trials(4), small_space()).unwrap();
    let scores = [0.5, 0.9, 0.9, 0.3];
    let mut call = 0;

    let best = study
        .optimize(
            |_| {
                let s = scores[call];
                call += 1;
                Ok(vec![s, s, s])
            },
            |_| {},
        )
        .unwrap();

    assert_eq!(best.number, 1);
    assert_eq!(best.mean_f1, Some(0.9));
    assert_eq!(best.std_f1, Some(0.0));
}

#[test]
fn test_failed_trials_are_excluded() {
    let mut study = Study::new(StudyConfig::default().with_n_trials(3), small_space()).unwrap();
    let mut call = 0;
    let mut seen = Vec::new();

    let best = study
        .optimize(
            |_| {
                call += 1;
                if call == 2 {
                    Ok(vec![0.7, 0.8, 0.9])
                } else {
                    Err(CoreError::InvalidValue("fit failed".to_string()))
                }
            },
            |t| seen.push(t.state),
        )
        .unwrap()
        .clone();

    assert_eq!(best.number, 1);
    assert_eq!(seen, vec![TrialState::Failed, TrialState::Complete, TrialState::Failed]);
    assert_eq!(study.n_complete(), 1);
    assert_eq!(study.trials()[0].error.as_deref(), Some("invalid value: fit failed"));
}

#[test]
fn test_no_complete_trial_fails_search() {
    let mut study = Study::new(StudyConfig::default().with_n_trials(2), small_space()).unwrap();

    let result = study.optimize(|_| Err(CoreError::InvalidValue("boom".to_string())), |_| {});
    assert!(matches!(result, Err(CoreError::Optimization(_))));
}

#[test]
fn test_zero_trials_rejected() {
    assert!(Study::new(StudyConfig::default().with_n_trials(0), SearchSpace::default()).is_err());
}

#[test]
fn test_cross_val_returns_one_score_per_fold() {
    let (x, y) = synthetic(150, 15, 4, 8);
    let scores = cross_val_f1(&x, &y, &ForestParams::new(5, Some(4)), 3).unwrap();

    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn test_run_optimization_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (x, y) = synthetic(300, 30, 4, 13);

    let mut config = ProjectConfig::default();
    config.training.model_dir = dir.path().join("models");
    let settings = TrainingSettings::from_config(&config, "baseline").unwrap();
    let prepared = prepare(&x, &y, &settings).unwrap();
    let tracker = MemoryTracker::new("optimization");
    let space = small_space();

    let result = run_optimization(
        &prepared,
        space.clone(),
        StudyConfig::default().with_n_trials(3),
        &settings,
        &tracker,
    )
    .unwrap();

    assert_eq!(result.trials.len(), 3);
    assert!(space.contains(&result.best_params));
    assert_eq!(result.model.params(), &result.best_params);
    assert!((0.0..=1.0).contains(&result.test_metrics.f1_score));

    let best = result
        .trials
        .iter()
        .filter_map(|t| t.mean_f1)
        .fold(f64::MIN, f64::max);
    assert_eq!(result.best_cv_f1, best);

    // 3 trials + the refit model
    assert_eq!(tracker.runs().len(), 4);
    if let Some(path) = result.outcome.path() {
        assert!(path.to_string_lossy().contains("fraud_model_optimized_"));
    }
}

#[test]
fn test_optimized_scaled_model_keeps_scaler() {
    let dir = TempDir::new().unwrap();
    let (x, y) = synthetic(300, 30, 4, 17);

    let mut config = ProjectConfig::default();
    config.training.model_dir = dir.path().join("models");
    config.training.scale = true;
    config.training.save_threshold = 0.0;
    let settings = TrainingSettings::from_config(&config, "baseline").unwrap();
    let prepared = prepare(&x, &y, &settings).unwrap();
    assert!(prepared.scaler.is_some());

    let result = run_optimization(
        &prepared,
        small_space(),
        StudyConfig::default().with_n_trials(2),
        &settings,
        &crate::logic::tracking::NoopTracker,
    )
    .unwrap();

    let path = result.outcome.path().expect("saved with threshold 0");
    assert!(scaler_path(path).exists());
    let scaler = crate::logic::data::StandardScaler::load(&scaler_path(path)).unwrap();
    assert_eq!(Some(&scaler), prepared.scaler.as_ref());
}
