//! Model and service descriptors

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_version: String,
    pub model_type: &'static str,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub model_params: BTreeMap<String, Value>,
    pub model_path: String,
    pub loaded_at: String,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: String,
}
