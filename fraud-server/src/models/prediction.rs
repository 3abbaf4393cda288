//! Prediction payloads

use fraud_core::constants::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// One transaction: the 28 anonymized components followed by the amount
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Transaction {
    #[validate(length(equal = 29))]
    pub features: Vec<f64>,
}

impl Transaction {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(|_| {
            AppError::ValidationError(format!(
                "Expected {} features, got {}",
                FEATURE_COUNT,
                self.features.len()
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_probability(p: f64) -> Self {
        if p < 0.3 {
            Confidence::Low
        } else if p < 0.7 {
            Confidence::Medium
        } else {
            Confidence::High
        }
    }
}

/// Counter label for a decided class
pub fn prediction_label(class: u8) -> &'static str {
    if class == 1 {
        "fraud"
    } else {
        "legitimate"
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub is_fraud: bool,
    pub fraud_probability: f64,
    pub confidence: Confidence,
    pub model_version: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub is_fraud: bool,
    pub fraud_probability: f64,
    pub model_version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub predictions: Vec<BatchPrediction>,
    pub count: usize,
}
