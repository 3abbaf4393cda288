//! Prometheus scrape endpoint

use axum::{extract::State, http::header, response::IntoResponse};

use crate::metrics::CONTENT_TYPE;
use crate::state::AppState;

pub async fn export(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.set_model_loaded(state.registry.is_loaded());
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], state.metrics.render())
}
