//! Preprocessing - stratified split and standardization

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{class_counts, Features, Labels};
use crate::logic::error::{CoreError, CoreResult};

/// Standard deviations below this are treated as constant features
const MIN_SCALE: f64 = 1e-12;

/// Train/test partitions produced by `train_test_split`
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Features,
    pub x_test: Features,
    pub y_train: Labels,
    pub y_test: Labels,
}

/// Stratified train/test split
///
/// Each class is shuffled independently and `round(n_class * test_size)` of its
/// members go to the test set, so both partitions keep the source fraud ratio.
/// The same `random_state` always yields the same partitions.
pub fn train_test_split(
    x: &Features,
    y: &[u8],
    test_size: f64,
    random_state: u64,
) -> CoreResult<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(CoreError::InvalidValue(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    if x.n_samples() != y.len() {
        return Err(CoreError::InvalidValue(format!(
            "{} feature rows but {} labels",
            x.n_samples(),
            y.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(random_state);
    let mut train_idx = Vec::with_capacity(y.len());
    let mut test_idx = Vec::with_capacity(y.len());

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n_test = (members.len() as f64 * test_size).round() as usize;
        test_idx.extend_from_slice(&members[..n_test]);
        train_idx.extend_from_slice(&members[n_test..]);
    }

    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(CoreError::InvalidValue(format!(
            "test_size {} leaves an empty partition for {} samples",
            test_size,
            y.len()
        )));
    }

    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    let y_train: Labels = train_idx.iter().map(|&i| y[i]).collect();
    let y_test: Labels = test_idx.iter().map(|&i| y[i]).collect();

    let [_, train_fraud] = class_counts(&y_train);
    let [_, test_fraud] = class_counts(&y_test);
    log::info!(
        "Train set: {} samples ({} fraud, {:.2}%)",
        y_train.len(),
        train_fraud,
        train_fraud as f64 / y_train.len() as f64 * 100.0
    );
    log::info!(
        "Test set: {} samples ({} fraud, {:.2}%)",
        y_test.len(),
        test_fraud,
        test_fraud as f64 / y_test.len() as f64 * 100.0
    );

    Ok(TrainTestSplit {
        x_train: x.select(&train_idx),
        x_test: x.select(&test_idx),
        y_train,
        y_test,
    })
}

/// Per-feature standardization (zero mean, unit variance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on training features only
    pub fn fit(x: &Features) -> CoreResult<Self> {
        let mean = x
            .values
            .mean_axis(Axis(0))
            .ok_or_else(|| CoreError::InvalidValue("cannot fit scaler on 0 samples".to_string()))?;
        let std = x.values.std_axis(Axis(0), 0.0);

        Ok(Self {
            mean: mean.to_vec(),
            scale: std
                .iter()
                .map(|&s| if s < MIN_SCALE { 1.0 } else { s })
                .collect(),
        })
    }

    pub fn transform(&self, x: &Features) -> CoreResult<Features> {
        if x.n_features() != self.mean.len() {
            return Err(CoreError::FeatureCountMismatch {
                expected: self.mean.len(),
                actual: x.n_features(),
            });
        }

        let mean = Array1::from(self.mean.clone());
        let scale = Array1::from(self.scale.clone());
        let values = (&x.values - &mean) / &scale;

        Ok(Features::new(x.names.clone(), values))
    }

    /// Scale one feature vector
    pub fn transform_row(&self, row: &[f64]) -> CoreResult<Vec<f64>> {
        if row.len() != self.mean.len() {
            return Err(CoreError::FeatureCountMismatch {
                expected: self.mean.len(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        log::info!("Scaler saved: {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Scaler file stored next to a model artifact
pub fn scaler_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("scaler.json")
}

/// Fit a scaler on `train` and apply it to both partitions
pub fn scale_features(
    train: &Features,
    test: &Features,
) -> CoreResult<(StandardScaler, Features, Features)> {
    let scaler = StandardScaler::fit(train)?;
    let train_scaled = scaler.transform(train)?;
    let test_scaled = scaler.transform(test)?;
    Ok((scaler, train_scaled, test_scaled))
}
