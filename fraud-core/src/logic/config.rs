//! Project Configuration
//!
//! TOML document with `[data]`, `[training]`, `[tracking]` tables and
//! named hyperparameter presets under `[models.<name>]`. Every field has a
//! default, so an empty document is a valid configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DROP_COLUMNS, DEFAULT_MODEL_NAME, DEFAULT_RANDOM_STATE, DEFAULT_SAVE_THRESHOLD,
    DEFAULT_TEST_SIZE, TARGET_COLUMN,
};
use crate::logic::data::Resampling;
use crate::logic::error::{CoreError, CoreResult};
use crate::logic::model::ForestParams;

/// Default config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "configs/model_params.toml";

/// Presets trained by `run_experiments`, in order
pub const EXPERIMENT_PRESETS: [&str; 3] = ["baseline", "variation_1", "variation_2"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_path: PathBuf,
    pub target_column: String,
    pub drop_columns: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/raw/creditcard.csv"),
            target_column: TARGET_COLUMN.to_string(),
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_size: f64,
    pub random_state: u64,
    /// Minimum test F1 for an artifact to be persisted
    pub save_threshold: f64,
    pub model_dir: PathBuf,
    pub model_name: String,
    pub scale: bool,
    pub resampling: Resampling,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            random_state: DEFAULT_RANDOM_STATE,
            save_threshold: DEFAULT_SAVE_THRESHOLD,
            model_dir: PathBuf::from("models"),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            scale: false,
            resampling: Resampling::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub dir: PathBuf,
    pub experiment: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("experiments"),
            experiment: "fraud-detection".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub tracking: TrackingConfig,
    pub models: BTreeMap<String, ForestParams>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            training: TrainingConfig::default(),
            tracking: TrackingConfig::default(),
            models: default_presets(),
        }
    }
}

/// Built-in presets used when the document defines none
pub fn default_presets() -> BTreeMap<String, ForestParams> {
    BTreeMap::from([
        ("baseline".to_string(), ForestParams::new(100, Some(10))),
        ("variation_1".to_string(), ForestParams::new(50, Some(5))),
        ("variation_2".to_string(), ForestParams::new(200, Some(20))),
    ])
}

impl ProjectConfig {
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let mut config: ProjectConfig = toml::from_str(text)?;
        if config.models.is_empty() {
            config.models = default_presets();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "Loaded config {} ({} model presets)",
            path.display(),
            config.models.len()
        );
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> CoreResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("Config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        let t = &self.training;
        if !(t.test_size > 0.0 && t.test_size < 1.0) {
            return Err(CoreError::Config(format!(
                "training.test_size must be in (0, 1), got {}",
                t.test_size
            )));
        }
        if !(0.0..=1.0).contains(&t.save_threshold) {
            return Err(CoreError::Config(format!(
                "training.save_threshold must be in [0, 1], got {}",
                t.save_threshold
            )));
        }
        for (name, params) in &self.models {
            params
                .validate()
                .map_err(|e| CoreError::Config(format!("models.{}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Hyperparameters of a named preset
    pub fn preset(&self, name: &str) -> CoreResult<ForestParams> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownPreset(name.to_string()))
    }

    pub fn drop_columns(&self) -> Vec<&str> {
        self.data.drop_columns.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::ClassWeight;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ProjectConfig::from_toml_str("").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.data.target_column, "Class");
        assert_eq!(config.drop_columns(), vec!["Time"]);
    }

    #[test]
    fn test_presets_from_document() {
        let text = r#"
            [training]
            save_threshold = 0.7
            resampling = "smote"

            [models.baseline]
            n_estimators = 100
            max_depth = 10

            [models.wide]
            n_estimators = 300
            class_weight = "none"
        "#;
        let config = ProjectConfig::from_toml_str(text).unwrap();

        assert_eq!(config.training.save_threshold, 0.7);
        assert_eq!(config.training.resampling, Resampling::Smote);
        assert_eq!(config.preset("wide").unwrap().n_estimators, 300);
        assert_eq!(config.preset("wide").unwrap().class_weight, ClassWeight::None);
        assert!(config.preset("variation_1").is_err());
    }

    #[test]
    fn test_unknown_preset() {
        let config = ProjectConfig::default();
        match config.preset("does_not_exist") {
            Err(e @ CoreError::UnknownPreset(_)) => {
                assert_eq!(e.kind(), crate::logic::error::ErrorKind::Validation)
            }
            other => panic!("Expected UnknownPreset, got {:?}", other),
        }
        for name in EXPERIMENT_PRESETS {
            assert!(config.preset(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ProjectConfig::from_toml_str("[training]\ntest_size = 1.5").is_err());
        assert!(ProjectConfig::from_toml_str("[models.bad]\nn_estimators = 0").is_err());
        assert!(matches!(
            ProjectConfig::from_toml_str("[training]\nresampling = \"adasyn\""),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.models.len(), 3);
    }
}
