//! Data Module - Dataset loading and preprocessing
//!
//! CSV → raw numeric table → (features, labels) → stratified split.
//! Optional scaling and class-imbalance resampling live next to the split.

pub mod loader;
pub mod preprocess;
pub mod resample;


use ndarray::{Array2, Axis};

use crate::logic::error::{CoreError, CoreResult};

pub use loader::{dataset_info, load_raw_data, read_csv, split_features_target, DatasetInfo};
pub use preprocess::{
    scale_features, scaler_path, train_test_split, StandardScaler, TrainTestSplit,
};
pub use resample::{resample, Resampling};

/// Binary labels (0 = legitimate, 1 = fraud)
pub type Labels = Vec<u8>;

/// Raw numeric table as read from disk (target column included)
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl RawDataset {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Feature matrix with its column names
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl Features {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Self {
        Self { names, values }
    }

    /// Build from row vectors; every row must have one value per name
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> CoreResult<Self> {
        if let Some(bad) = rows.iter().find(|r| r.len() != names.len()) {
            return Err(CoreError::FeatureCountMismatch {
                expected: names.len(),
                actual: bad.len(),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((rows.len(), names.len()), flat)
            .map_err(|e| CoreError::InvalidValue(e.to_string()))?;
        Ok(Self { names, values })
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Features {
        Features {
            names: self.names.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }
}

/// Count of (legitimate, fraud) labels
pub fn class_counts(labels: &[u8]) -> [usize; 2] {
    let fraud = labels.iter().filter(|&&l| l == 1).count();
    [labels.len() - fraud, fraud]
}

/// Fraction of fraud labels (0.0 for an empty slice)
pub fn fraud_rate(labels: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    class_counts(labels)[1] as f64 / labels.len() as f64
}
