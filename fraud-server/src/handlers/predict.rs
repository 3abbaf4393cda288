//! Prediction handlers

use std::time::Instant;

use axum::{extract::State, Json};
use fraud_core::decide;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::{
    prediction_label, BatchPrediction, BatchResponse, Confidence, PredictionResponse, Transaction,
};
use crate::state::AppState;

/// Score a single transaction
pub async fn predict(
    State(state): State<AppState>,
    AppJson(transaction): AppJson<Transaction>,
) -> AppResult<Json<PredictionResponse>> {
    let started = Instant::now();
    let result = score_one(&state, &transaction);
    state.metrics.observe_latency(started.elapsed());

    result
        .map(Json)
        .inspect_err(|e| state.metrics.record_error(e.error_type()))
}

fn score_one(state: &AppState, transaction: &Transaction) -> AppResult<PredictionResponse> {
    transaction.check()?;
    let loaded = state.registry.current().ok_or(AppError::ModelNotLoaded)?;

    let proba = loaded
        .score(std::slice::from_ref(&transaction.features))
        .map_err(|e| AppError::prediction(e, state.config.is_production()))?;
    let [p_legit, p_fraud] = proba
        .first()
        .copied()
        .ok_or_else(|| AppError::prediction("empty prediction", state.config.is_production()))?;

    let class = decide([p_legit, p_fraud]);
    state
        .metrics
        .record_prediction(&loaded.version, prediction_label(class));
    tracing::info!(
        "Prediction: {} | Probability: {:.4} | Model: {}",
        prediction_label(class),
        p_fraud,
        loaded.version
    );

    Ok(PredictionResponse {
        is_fraud: class == 1,
        fraud_probability: p_fraud,
        confidence: Confidence::from_probability(p_fraud),
        model_version: loaded.version.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Score a list of transactions; one invalid item rejects the whole batch
pub async fn predict_batch(
    State(state): State<AppState>,
    AppJson(transactions): AppJson<Vec<Transaction>>,
) -> AppResult<Json<BatchResponse>> {
    let started = Instant::now();
    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || score_batch(&worker, &transactions))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
        .and_then(|r| r);
    state.metrics.observe_latency(started.elapsed());

    result
        .map(Json)
        .inspect_err(|e| state.metrics.record_error(e.error_type()))
}

fn score_batch(state: &AppState, transactions: &[Transaction]) -> AppResult<BatchResponse> {
    for (index, transaction) in transactions.iter().enumerate() {
        transaction.check().map_err(|e| match e {
            AppError::ValidationError(msg) => {
                AppError::ValidationError(format!("Transaction {}: {}", index, msg))
            }
            other => other,
        })?;
    }
    let loaded = state.registry.current().ok_or(AppError::ModelNotLoaded)?;

    let rows: Vec<Vec<f64>> = transactions.iter().map(|t| t.features.clone()).collect();
    let proba = loaded
        .score(&rows)
        .map_err(|e| AppError::prediction(e, state.config.is_production()))?;

    let predictions: Vec<BatchPrediction> = proba
        .into_iter()
        .map(|p| {
            let class = decide(p);
            state
                .metrics
                .record_prediction(&loaded.version, prediction_label(class));
            BatchPrediction {
                is_fraud: class == 1,
                fraud_probability: p[1],
                model_version: loaded.version.clone(),
            }
        })
        .collect();

    tracing::info!("Batch prediction: {} transactions", predictions.len());
    Ok(BatchResponse {
        count: predictions.len(),
        predictions,
    })
}
