//! Shared application state
//!
//! The model lives in a `ModelRegistry`: readers clone an `Arc` snapshot
//! under a short read lock, reload deserializes outside the lock and
//! swaps under the write lock. A failed reload leaves the current
//! snapshot untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fraud_core::logic::data::{scaler_path, StandardScaler};
use fraud_core::{CoreResult, FraudDetectionModel};
use parking_lot::RwLock;

use crate::config::Config;
use crate::metrics::ApiMetrics;

/// A model snapshot with the metadata reported by `/model/info`
#[derive(Debug)]
pub struct LoadedModel {
    pub model: FraudDetectionModel,
    /// Present when the model was trained on scaled features
    pub scaler: Option<StandardScaler>,
    pub version: String,
    pub path: PathBuf,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedModel {
    pub fn new(model: FraudDetectionModel, version: &str, path: &Path) -> Self {
        Self {
            model,
            scaler: None,
            version: version.to_string(),
            path: path.to_path_buf(),
            loaded_at: Utc::now(),
        }
    }

    /// Load an artifact and its scaler file, if one sits next to it
    pub fn open(path: &Path, version: &str) -> CoreResult<Self> {
        let model = FraudDetectionModel::load(path)?;
        let scaler_file = scaler_path(path);
        let scaler = if scaler_file.exists() {
            Some(StandardScaler::load(&scaler_file)?)
        } else {
            None
        };
        Ok(Self {
            scaler,
            ..Self::new(model, version, path)
        })
    }

    /// `[p_legit, p_fraud]` per row, scaling first when needed
    pub fn score(&self, rows: &[Vec<f64>]) -> CoreResult<Vec<[f64; 2]>> {
        match &self.scaler {
            Some(scaler) => {
                let scaled = rows
                    .iter()
                    .map(|r| scaler.transform_row(r))
                    .collect::<CoreResult<Vec<_>>>()?;
                self.model.predict_rows(&scaled)
            }
            None => self.model.predict_rows(rows),
        }
    }
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    current: RwLock<Option<Arc<LoadedModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: LoadedModel) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(model))),
        }
    }

    /// Snapshot of the active model, if any
    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.current.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Load `path` and make it the active model
    pub fn reload(&self, path: &Path, version: &str) -> CoreResult<Arc<LoadedModel>> {
        let loaded = Arc::new(LoadedModel::open(path, version)?);

        *self.current.write() = Some(Arc::clone(&loaded));
        tracing::info!("Model {} active ({})", version, path.display());
        Ok(loaded)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<ModelRegistry>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(config: Config, registry: ModelRegistry) -> Self {
        let metrics = ApiMetrics::new();
        metrics.set_model_loaded(registry.is_loaded());
        Self {
            config,
            registry: Arc::new(registry),
            metrics: Arc::new(metrics),
        }
    }

    /// Try to load the configured artifact; an unreadable artifact leaves
    /// the registry empty so the service still starts
    pub fn load(config: Config) -> Self {
        let registry = ModelRegistry::new();
        if let Err(e) = registry.reload(&config.model_path, &config.model_version) {
            tracing::warn!(
                "Could not load model from {}: {}. Serving without a model",
                config.model_path.display(),
                e
            );
        }
        Self::new(config, registry)
    }
}
