//! Fraud Detection Inference API
//!
//! Serves the random forest trained by `fraud-core` over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FRAUD DETECTION API                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────────┐  ┌──────────────────┐ │
//! │  │  Router   │  │  ModelRegistry   │  │  ApiMetrics      │ │
//! │  │  (Axum)   │─▶│  Arc snapshot    │  │  (Prometheus     │ │
//! │  │           │  │  hot reload      │  │   text format)   │ │
//! │  └───────────┘  └────────┬─────────┘  └──────────────────┘ │
//! │                          ▼                                  │
//! │                 ┌─────────────────┐                         │
//! │                 │ model artifact  │                         │
//! │                 └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::{AppState, LoadedModel, ModelRegistry};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let prediction_routes = Router::new()
        .route("/predict", post(handlers::predict::predict))
        .route("/predict/batch", post(handlers::predict::predict_batch));

    let model_routes = Router::new()
        .route("/model/info", get(handlers::model::info))
        .route("/model/reload", post(handlers::model::reload));

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .route("/metrics", get(handlers::metrics::export))
        .merge(prediction_routes)
        .merge(model_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
