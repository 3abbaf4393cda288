//! Model management handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use fraud_core::constants::{feature_names, MODEL_TYPE};

use crate::error::{AppError, AppResult};
use crate::models::{ModelInfo, ReloadResponse};
use crate::state::AppState;

pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let loaded = state.registry.current().ok_or(AppError::ModelNotLoaded)?;
    let model = &loaded.model;

    Ok(Json(ModelInfo {
        model_version: loaded.version.clone(),
        model_type: MODEL_TYPE,
        n_features: model.n_features().unwrap_or_default(),
        feature_names: model
            .feature_names()
            .map(<[String]>::to_vec)
            .unwrap_or_else(feature_names),
        model_params: model.params().to_map(),
        model_path: loaded.path.display().to_string(),
        loaded_at: loaded.loaded_at.to_rfc3339(),
    }))
}

/// Re-read the configured artifact; the active model survives a failure
pub async fn reload(State(state): State<AppState>) -> AppResult<Json<ReloadResponse>> {
    let registry = Arc::clone(&state.registry);
    let path = state.config.model_path.clone();
    let version = state.config.model_version.clone();

    let result = tokio::task::spawn_blocking(move || registry.reload(&path, &version))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    match result {
        Ok(loaded) => {
            state.metrics.set_model_loaded(true);
            Ok(Json(ReloadResponse {
                status: "success",
                message: format!("Model {} reloaded successfully", loaded.version),
                timestamp: chrono::Utc::now().to_rfc3339(),
            }))
        }
        Err(e) => {
            let err = AppError::ReloadFailed(e.to_string());
            state.metrics.record_error(err.error_type());
            Err(err)
        }
    }
}
