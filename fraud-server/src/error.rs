//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fraud_core::{CoreError, ErrorKind};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),

    // Model errors
    ModelNotLoaded,
    ReloadFailed(String),
    PredictionError {
        detail: String,
        redact: bool,
    },

    // Generic errors
    InternalError(String),
}

impl AppError {
    /// Label used for `prediction_errors_total{error_type}`
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::ModelNotLoaded => "model_not_loaded",
            AppError::ReloadFailed(_) => "reload",
            AppError::PredictionError { .. } => "prediction",
            AppError::InternalError(_) => "internal",
        }
    }

    /// Prediction failure; `redact` hides the detail from clients
    pub fn prediction(err: impl ToString, redact: bool) -> Self {
        AppError::PredictionError {
            detail: err.to_string(),
            redact,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::ModelNotLoaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Model not loaded. Please check server logs.".to_string(),
            ),
            AppError::ReloadFailed(msg) => {
                tracing::error!("Model reload failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to reload model".to_string(),
                )
            }
            AppError::PredictionError { detail, redact } => {
                tracing::error!("Prediction error: {}", detail);
                let msg = if *redact {
                    "Prediction failed".to_string()
                } else {
                    format!("Prediction failed: {}", detail)
                };
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err.kind() {
            ErrorKind::Validation => AppError::ValidationError(err.to_string()),
            ErrorKind::State => AppError::ModelNotLoaded,
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status() {
        let mismatch = CoreError::FeatureCountMismatch {
            expected: 29,
            actual: 20,
        };
        let status = |e: AppError| e.into_response().status();

        assert_eq!(status(mismatch.into()), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(CoreError::NotTrained.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(CoreError::Artifact("checksum mismatch".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_types_are_labels() {
        assert_eq!(AppError::ModelNotLoaded.error_type(), "model_not_loaded");
        assert_eq!(AppError::prediction("boom", true).error_type(), "prediction");
    }
}
