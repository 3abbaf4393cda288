//! Hyperparameter Set
//!
//! Strongly typed forest configuration with explicit defaults.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::DEFAULT_RANDOM_STATE;
use crate::logic::error::{CoreError, CoreResult};

/// Class weighting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Weight each class by `n_samples / (2 * n_class)`
    #[default]
    Balanced,
    /// Every sample weighs 1
    None,
}

impl ClassWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::None => "none",
        }
    }

    /// Per-class weights for the given labels
    pub fn weights(&self, labels: &[u8]) -> [f64; 2] {
        match self {
            Self::None => [1.0, 1.0],
            Self::Balanced => {
                let n = labels.len() as f64;
                let fraud = labels.iter().filter(|&&l| l == 1).count() as f64;
                let legit = n - fraud;
                let w = |count: f64| if count > 0.0 { n / (2.0 * count) } else { 1.0 };
                [w(legit), w(fraud)]
            }
        }
    }
}

impl fmt::Display for ClassWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    pub class_weight: ClassWeight,
    /// Seed (None = fresh entropy per fit)
    pub random_state: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Balanced,
            random_state: Some(DEFAULT_RANDOM_STATE),
        }
    }
}

impl ForestParams {
    pub fn new(n_estimators: usize, max_depth: Option<usize>) -> Self {
        Self {
            n_estimators,
            max_depth,
            ..Default::default()
        }
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.n_estimators == 0 {
            return Err(CoreError::InvalidValue("n_estimators must be >= 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(CoreError::InvalidValue("max_depth must be >= 1".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(CoreError::InvalidValue(
                "min_samples_split must be >= 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(CoreError::InvalidValue(
                "min_samples_leaf must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Flat name → value view (tracking and the model info endpoint)
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("n_estimators".to_string(), json!(self.n_estimators));
        map.insert("max_depth".to_string(), json!(self.max_depth));
        map.insert("min_samples_split".to_string(), json!(self.min_samples_split));
        map.insert("min_samples_leaf".to_string(), json!(self.min_samples_leaf));
        map.insert("class_weight".to_string(), json!(self.class_weight.as_str()));
        map.insert("random_state".to_string(), json!(self.random_state));
        map
    }
}
