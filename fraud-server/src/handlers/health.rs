//! Liveness and health handlers

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model_version: String,
    timestamp: String,
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Fraud Detection API",
        "version": state.config.model_version,
        "service_version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "predict": "/predict",
            "predict_batch": "/predict/batch",
            "model_info": "/model/info",
            "model_reload": "/model/reload",
            "metrics": "/metrics"
        }
    }))
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let current = state.registry.current();
    let model_version = current
        .as_ref()
        .map(|m| m.version.clone())
        .unwrap_or_else(|| state.config.model_version.clone());

    Json(HealthResponse {
        status: if current.is_some() { "healthy" } else { "unhealthy" },
        model_loaded: current.is_some(),
        model_version,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
