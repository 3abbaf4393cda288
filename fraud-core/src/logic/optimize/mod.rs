//! Optimize Module - Hyperparameter search
//!
//! Random sampling over `SearchSpace`, each candidate scored by stratified
//! k-fold F1 on the training set. The winner is refit on the whole training
//! set and evaluated once on the held-out test set.

pub mod cv;
pub mod space;
pub mod study;

#[cfg(test)]
mod tests;

use serde_json::json;

use crate::logic::error::CoreResult;
use crate::logic::model::{ClassificationMetrics, ForestParams, FraudDetectionModel};
use crate::logic::pipeline::steps::{evaluate_step, log_split_params, save_step, train_step};
use crate::logic::pipeline::{PipelineContext, PreparedData, SaveOutcome, TrainingSettings};
use crate::logic::tracking::{ExperimentTracker, RunStatus};

pub use cv::{cross_val_f1, mean_std, stratified_kfold};
pub use space::{IntRange, SearchSpace};
pub use study::{Study, StudyConfig, Trial, TrialState};

/// Run name of the refit winner
pub const BEST_RUN_NAME: &str = "optimized_best_model";

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub trials: Vec<Trial>,
    pub best_params: ForestParams,
    /// Mean cross-validated F1 of the winning trial
    pub best_cv_f1: f64,
    pub test_metrics: ClassificationMetrics,
    pub model: FraudDetectionModel,
    pub outcome: SaveOutcome,
}

/// Search, refit the winner on the whole training partition and evaluate it
/// on the test set
///
/// Each trial is reported as its own tracked run; the refit model gets a final
/// run and goes through the same conditional save as a regular training,
/// scaler included.
pub fn run_optimization(
    prepared: &PreparedData,
    space: SearchSpace,
    config: StudyConfig,
    settings: &TrainingSettings,
    tracker: &dyn ExperimentTracker,
) -> CoreResult<OptimizationResult> {
    log::info!(
        "Optimizing over {} trials ({}-fold CV)",
        config.n_trials,
        config.cv_folds
    );
    let split = &prepared.split;
    let folds = config.cv_folds;
    let mut study = Study::new(config, space)?;

    let best = study
        .optimize(
            |params| cross_val_f1(&split.x_train, &split.y_train, params, folds),
            |trial| report_trial(tracker, trial),
        )?
        .clone();

    let best_cv_f1 = best.mean_f1.unwrap_or_default();
    log::info!(
        "Best trial {}: f1 {:.4} ({} of {} trials complete)",
        best.number,
        best_cv_f1,
        study.n_complete(),
        study.trials().len()
    );

    let mut final_settings = settings.clone();
    final_settings.params = best.params.clone();
    final_settings.model_name = format!("{}_optimized", settings.model_name);

    let mut ctx = PipelineContext::start(tracker, BEST_RUN_NAME);
    log_split_params(&ctx, split);
    ctx.log_param("best_trial", json!(best.number));
    ctx.log_metric("best_cv_f1", best_cv_f1);

    let refit = (|| -> CoreResult<(FraudDetectionModel, ClassificationMetrics, SaveOutcome)> {
        let model = train_step(&mut ctx, split, &final_settings.params)?;
        let metrics = evaluate_step(&mut ctx, &model, split)?;
        let outcome = save_step(
            &mut ctx,
            &model,
            prepared.scaler.as_ref(),
            metrics.f1_score,
            &final_settings,
        )?;
        Ok((model, metrics, outcome))
    })();
    ctx.finish();
    let (model, test_metrics, outcome) = refit?;

    Ok(OptimizationResult {
        trials: study.trials().to_vec(),
        best_params: best.params,
        best_cv_f1,
        test_metrics,
        model,
        outcome,
    })
}

/// One tracked run per trial; tracker errors are logged only
fn report_trial(tracker: &dyn ExperimentTracker, trial: &Trial) {
    let outcome = (|| -> CoreResult<()> {
        let run = tracker.start_run(&format!("trial_{}", trial.number))?;
        tracker.log_params(&run, &trial.params.to_map())?;
        let status = match (trial.mean_f1, trial.std_f1) {
            (Some(mean), Some(std)) => {
                tracker.log_metric(&run, "f1_score", mean)?;
                tracker.log_metric(&run, "std_f1", std)?;
                RunStatus::Finished
            }
            _ => RunStatus::Failed,
        };
        tracker.end_run(&run, status)
    })();

    if let Err(e) = outcome {
        log::warn!("Tracker failed to record trial {}: {}", trial.number, e);
    }
}
