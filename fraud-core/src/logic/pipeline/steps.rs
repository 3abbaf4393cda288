//! Pipeline Steps
//!
//! load → preprocess → train → evaluate → save. Each step is a plain
//! function wrapped in a `PipelineContext` stage.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::json;

use super::context::PipelineContext;
use super::{SaveOutcome, TrainingSettings};
use crate::constants::ARTIFACT_EXT;
use crate::logic::data::{
    fraud_rate, load_raw_data, resample, scale_features, scaler_path, split_features_target,
    train_test_split, Features, Labels, Resampling, StandardScaler, TrainTestSplit,
};
use crate::logic::error::CoreResult;
use crate::logic::model::{ClassificationMetrics, ForestParams, FraudDetectionModel};

/// Split data after optional scaling and resampling
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub split: TrainTestSplit,
    pub scaler: Option<StandardScaler>,
}

pub fn load_data_step(ctx: &mut PipelineContext<'_>, settings: &TrainingSettings) -> CoreResult<(Features, Labels)> {
    ctx.stage(
        "load_data",
        |(x, _): &(Features, Labels)| format!("{} samples, {} features", x.n_samples(), x.n_features()),
        || {
            let raw = load_raw_data(&settings.data_path)?;
            let drop: Vec<&str> = settings.drop_columns.iter().map(String::as_str).collect();
            split_features_target(&raw, &settings.target_column, &drop)
        },
    )
}

pub fn preprocess_step(
    ctx: &mut PipelineContext<'_>,
    x: &Features,
    y: &[u8],
    settings: &TrainingSettings,
) -> CoreResult<PreparedData> {
    let prepared = ctx.stage(
        "preprocess",
        |p: &PreparedData| {
            format!(
                "{} train / {} test samples",
                p.split.y_train.len(),
                p.split.y_test.len()
            )
        },
        || prepare(x, y, settings),
    )?;

    ctx.log_param("test_size", json!(settings.test_size));
    ctx.log_param("scale", json!(settings.scale));
    ctx.log_param("resampling", json!(settings.resampling.as_str()));
    log_split_params(ctx, &prepared.split);
    Ok(prepared)
}

/// Split, then scale and resample the training partition as configured
pub fn prepare(x: &Features, y: &[u8], settings: &TrainingSettings) -> CoreResult<PreparedData> {
    let mut split = train_test_split(x, y, settings.test_size, settings.random_state)?;

    let scaler = if settings.scale {
        let (scaler, train, test) = scale_features(&split.x_train, &split.x_test)?;
        split.x_train = train;
        split.x_test = test;
        Some(scaler)
    } else {
        None
    };

    if settings.resampling != Resampling::None {
        let (x_res, y_res) = resample(
            &split.x_train,
            &split.y_train,
            settings.resampling,
            settings.random_state,
        )?;
        split.x_train = x_res;
        split.y_train = y_res;
    }

    Ok(PreparedData { split, scaler })
}

/// Dataset figures every run reports
pub fn log_split_params(ctx: &PipelineContext<'_>, split: &TrainTestSplit) {
    ctx.log_param("train_samples", json!(split.y_train.len()));
    ctx.log_param("test_samples", json!(split.y_test.len()));
    ctx.log_param("n_features", json!(split.x_train.n_features()));
    ctx.log_param("fraud_rate_train", json!(fraud_rate(&split.y_train)));
}

pub fn train_step(
    ctx: &mut PipelineContext<'_>,
    split: &TrainTestSplit,
    params: &ForestParams,
) -> CoreResult<FraudDetectionModel> {
    ctx.log_params(&params.to_map());
    ctx.stage(
        "train",
        |m: &FraudDetectionModel| format!("{} trees", m.params().n_estimators),
        || {
            let mut model = FraudDetectionModel::new(params.clone());
            model.train(&split.x_train, &split.y_train)?;
            Ok(model)
        },
    )
}

pub fn evaluate_step(
    ctx: &mut PipelineContext<'_>,
    model: &FraudDetectionModel,
    split: &TrainTestSplit,
) -> CoreResult<ClassificationMetrics> {
    let metrics = ctx.stage(
        "evaluate",
        |m: &ClassificationMetrics| format!("f1 {:.4}, roc_auc {:.4}", m.f1_score, m.roc_auc),
        || model.evaluate(&split.x_test, &split.y_test),
    )?;
    ctx.log_metrics(&metrics.to_map());

    if let Ok(cm) = model.confusion_matrix(&split.x_test, &split.y_test) {
        ctx.log_metric("true_negative", cm.true_negative as f64);
        ctx.log_metric("false_positive", cm.false_positive as f64);
        ctx.log_metric("false_negative", cm.false_negative as f64);
        ctx.log_metric("true_positive", cm.true_positive as f64);
    }
    Ok(metrics)
}

/// Whether a model with this F1 clears the save threshold
pub fn should_persist(f1: f64, threshold: f64) -> bool {
    f1 >= threshold
}

/// `<dir>/<name>_<YYYYmmdd_HHMMSS>.model`
pub fn artifact_path(dir: &Path, model_name: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.{}", model_name, timestamp, ARTIFACT_EXT))
}

pub fn save_step(
    ctx: &mut PipelineContext<'_>,
    model: &FraudDetectionModel,
    scaler: Option<&StandardScaler>,
    f1: f64,
    settings: &TrainingSettings,
) -> CoreResult<SaveOutcome> {
    let outcome = ctx.stage(
        "save_model",
        |o: &SaveOutcome| o.to_string(),
        || {
            if !should_persist(f1, settings.save_threshold) {
                log::warn!(
                    "F1-score ({:.4}) < threshold ({}). Model not saved.",
                    f1,
                    settings.save_threshold
                );
                return Ok(SaveOutcome::NotSaved {
                    f1,
                    threshold: settings.save_threshold,
                });
            }

            let path = artifact_path(&settings.model_dir, &settings.model_name);
            model.save(&path)?;
            if let Some(scaler) = scaler {
                scaler.save(&scaler_path(&path))?;
            }
            Ok(SaveOutcome::Saved(path))
        },
    )?;

    if let SaveOutcome::Saved(path) = &outcome {
        ctx.log_artifact(path);
    }
    Ok(outcome)
}
