//! Pipeline Module - Training orchestration
//!
//! Sequences loader → preprocessor → model → metrics → conditional save,
//! one tracked run per training.
//!
//! ## Structure
//! - `context.rs` - PipelineContext (stage timing + tracker forwarding)
//! - `steps.rs` - Individual pipeline steps
//! - `experiments.rs` - Preset comparison runs

pub mod context;
pub mod experiments;
pub mod steps;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::logic::config::ProjectConfig;
use crate::logic::data::Resampling;
use crate::logic::error::CoreResult;
use crate::logic::model::{ClassificationMetrics, ForestParams};
use crate::logic::tracking::{ExperimentTracker, RunId};

pub use context::{PipelineContext, StageRecord};
pub use experiments::{run_experiments, ExperimentResult, ExperimentSummary};
pub use steps::{artifact_path, prepare, should_persist, PreparedData};

/// Everything one training run needs
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSettings {
    pub data_path: PathBuf,
    pub target_column: String,
    pub drop_columns: Vec<String>,
    pub test_size: f64,
    pub random_state: u64,
    pub params: ForestParams,
    pub save_threshold: f64,
    pub model_dir: PathBuf,
    pub model_name: String,
    pub scale: bool,
    pub resampling: Resampling,
}

impl TrainingSettings {
    /// Settings for preset `preset` of `config`
    pub fn from_config(config: &ProjectConfig, preset: &str) -> CoreResult<Self> {
        Ok(Self {
            data_path: config.data.raw_path.clone(),
            target_column: config.data.target_column.clone(),
            drop_columns: config.data.drop_columns.clone(),
            test_size: config.training.test_size,
            random_state: config.training.random_state,
            params: config.preset(preset)?,
            save_threshold: config.training.save_threshold,
            model_dir: config.training.model_dir.clone(),
            model_name: config.training.model_name.clone(),
            scale: config.training.scale,
            resampling: config.training.resampling,
        })
    }
}

/// Result of the conditional save step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved(PathBuf),
    NotSaved { f1: f64, threshold: f64 },
}

impl SaveOutcome {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            SaveOutcome::Saved(path) => Some(path),
            SaveOutcome::NotSaved { .. } => None,
        }
    }
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOutcome::Saved(path) => write!(f, "saved to {}", path.display()),
            SaveOutcome::NotSaved { f1, threshold } => {
                write!(f, "not saved (f1 {:.4} < {})", f1, threshold)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub run_id: Option<RunId>,
    pub metrics: ClassificationMetrics,
    pub outcome: SaveOutcome,
    pub feature_importance: Vec<(String, f64)>,
    pub stages: Vec<StageRecord>,
}

/// Full training run: any stage failure aborts it
pub fn run_training(
    settings: &TrainingSettings,
    tracker: &dyn ExperimentTracker,
    run_name: &str,
) -> CoreResult<TrainingReport> {
    let mut ctx = PipelineContext::start(tracker, run_name);

    let result = execute(&mut ctx, settings);
    let (run_id, stages) = ctx.finish();
    let (metrics, feature_importance, outcome) = result?;

    log::info!("Pipeline finished: {}", outcome);
    Ok(TrainingReport {
        run_id,
        metrics,
        outcome,
        feature_importance,
        stages,
    })
}

fn execute(
    ctx: &mut PipelineContext<'_>,
    settings: &TrainingSettings,
) -> CoreResult<(ClassificationMetrics, Vec<(String, f64)>, SaveOutcome)> {
    let (x, y) = steps::load_data_step(ctx, settings)?;
    let prepared = steps::preprocess_step(ctx, &x, &y, settings)?;
    let model = steps::train_step(ctx, &prepared.split, &settings.params)?;
    let metrics = steps::evaluate_step(ctx, &model, &prepared.split)?;
    let feature_importance = model.feature_importance(&prepared.split.x_train.names)?;
    let outcome = steps::save_step(
        ctx,
        &model,
        prepared.scaler.as_ref(),
        metrics.f1_score,
        settings,
    )?;
    Ok((metrics, feature_importance, outcome))
}
