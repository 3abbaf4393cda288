//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Version label reported with every prediction
    pub model_version: String,

    /// Artifact loaded at startup and on reload
    pub model_path: PathBuf,

    /// Environment (development, production)
    pub environment: String,

    /// `pretty` or `json`
    pub log_format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let model_version = env::var("MODEL_VERSION").unwrap_or_else(|_| "v1".to_string());

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_model_path(&model_version)),

            model_version,

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// `models/fraud_model_<version>.model`
pub fn default_model_path(version: &str) -> PathBuf {
    PathBuf::from(format!("models/fraud_model_{}.model", version))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            model_version: "v1".to_string(),
            model_path: default_model_path("v1"),
            environment: "development".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}
