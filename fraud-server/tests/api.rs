use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fraud_core::constants::{feature_names, FEATURE_COUNT};
use fraud_core::{Features, ForestParams, FraudDetectionModel};
use fraud_server::{create_router, AppState, Config};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Every tenth row is fraud, shifted by +4 on V1 and V2
fn train_model(seed: u64) -> FraudDetectionModel {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..300 {
        let fraud = i % 10 == 0;
        let mut row: Vec<f64> = (0..FEATURE_COUNT)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        if fraud {
            row[0] += 4.0;
            row[1] += 4.0;
        }
        rows.push(row);
        labels.push(u8::from(fraud));
    }

    let x = Features::from_rows(feature_names(), &rows).unwrap();
    let mut model = FraudDetectionModel::new(ForestParams::new(10, Some(5)));
    model.train(&x, &labels).unwrap();
    model
}

fn config_for(path: &Path) -> Config {
    Config {
        model_path: path.to_path_buf(),
        ..Config::default()
    }
}

fn model_path(dir: &TempDir) -> PathBuf {
    dir.path().join("fraud_model_v1.model")
}

/// Router backed by a freshly trained and saved model
fn app_with_model(dir: &TempDir) -> Router {
    let path = model_path(dir);
    train_model(7).save(&path).unwrap();
    create_router(AppState::load(config_for(&path)))
}

fn app_without_model(dir: &TempDir) -> Router {
    create_router(AppState::load(config_for(&model_path(dir))))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn transaction(features: Vec<f64>) -> Value {
    json!({ "features": features })
}

#[tokio::test]
async fn test_root_and_health() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["endpoints"]["predict"], "/predict");

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_version"], "v1");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_predict_zero_vector() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let (status, body) = send(
        &app,
        post_json("/predict", &transaction(vec![0.0; FEATURE_COUNT])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let is_fraud = body["is_fraud"].as_bool().unwrap();
    let p = body["fraud_probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&p));
    assert_eq!(is_fraud, p > 0.5);
    assert!(["low", "medium", "high"].contains(&body["confidence"].as_str().unwrap()));
    assert_eq!(body["model_version"], "v1");
}

#[tokio::test]
async fn test_predict_flags_shifted_transaction() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let mut features = vec![0.0; FEATURE_COUNT];
    features[0] = 4.0;
    features[1] = 4.0;
    let (status, body) = send(&app, post_json("/predict", &transaction(features))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["fraud_probability"].as_f64().unwrap() > 0.5, "{}", body);
    assert_eq!(body["is_fraud"], true);
}

#[tokio::test]
async fn test_predict_wrong_length_is_422() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let (status, body) = send(&app, post_json("/predict", &transaction(vec![0.0; 20]))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Expected 29 features, got 20");
    assert_eq!(body["status"], 422);
}

#[tokio::test]
async fn test_predict_non_numeric_is_422() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let mut features: Vec<Value> = vec![json!(0.0); FEATURE_COUNT];
    features[3] = json!("abc");
    let (status, _) = send(&app, post_json("/predict", &json!({ "features": features }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, post_json("/predict", &json!({ "amount": 12.5 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_no_model_is_503() {
    let dir = TempDir::new().unwrap();
    let app = app_without_model(&dir);

    let (status, body) = send(
        &app,
        post_json("/predict", &transaction(vec![0.0; FEATURE_COUNT])),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("model not loaded"));

    let (status, _) = send(&app, get("/model/info")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_batch_prediction() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let batch = json!([
        { "features": vec![0.0; FEATURE_COUNT] },
        { "features": vec![0.5; FEATURE_COUNT] },
        { "features": vec![-0.5; FEATURE_COUNT] },
    ]);
    let (status, body) = send(&app, post_json("/predict/batch", &batch)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);
    for p in predictions {
        assert!((0.0..=1.0).contains(&p["fraud_probability"].as_f64().unwrap()));
        assert_eq!(p["model_version"], "v1");
    }
}

#[tokio::test]
async fn test_batch_with_invalid_item_fails_whole_batch() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let batch = json!([
        { "features": vec![0.0; FEATURE_COUNT] },
        { "features": vec![0.0; 5] },
    ]);
    let (status, body) = send(&app, post_json("/predict/batch", &batch)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Transaction 1: Expected 29 features, got 5");
}

#[tokio::test]
async fn test_model_info() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let (status, body) = send(&app, get("/model/info")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_version"], "v1");
    assert_eq!(body["model_type"], "RandomForestClassifier");
    assert_eq!(body["n_features"], 29);
    assert_eq!(body["feature_names"].as_array().unwrap().len(), 29);
    assert_eq!(body["feature_names"][28], "Amount");
    assert_eq!(body["model_params"]["n_estimators"], 10);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    send(
        &app,
        post_json("/predict", &transaction(vec![0.0; FEATURE_COUNT])),
    )
    .await;
    send(&app, post_json("/predict", &transaction(vec![0.0; 3]))).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("predictions_total{model_version=\"v1\""));
    assert!(text.contains("prediction_errors_total{error_type=\"validation\"} 1"));
    assert!(text.contains("prediction_latency_seconds_count 2"));
    assert!(text.contains("model_loaded 1"));
}

#[tokio::test]
async fn test_reload_loads_new_artifact() {
    let dir = TempDir::new().unwrap();
    let app = app_without_model(&dir);

    train_model(11).save(&model_path(&dir)).unwrap();
    let (status, body) = send(&app, post_json("/model/reload", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, _) = send(
        &app,
        post_json("/predict", &transaction(vec![0.0; FEATURE_COUNT])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_model() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    std::fs::write(model_path(&dir), b"not a model").unwrap();
    let (status, body) = send(&app, post_json("/model/reload", &json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to reload model");

    let (status, _) = send(
        &app,
        post_json("/predict", &transaction(vec![0.0; FEATURE_COUNT])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/health")).await;
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_large_batch_scored_off_runtime() {
    let dir = TempDir::new().unwrap();
    let app = app_with_model(&dir);

    let items: Vec<Value> = (0..500)
        .map(|i| transaction(vec![(i % 7) as f64 * 0.1; FEATURE_COUNT]))
        .collect();
    let (status, body) = send(&app, post_json("/predict/batch", &Value::Array(items))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 500);

    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}
