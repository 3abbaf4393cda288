//! Class-imbalance resampling
//!
//! Random over/under-sampling and SMOTE-style synthetic oversampling.
//! Every method returns a balanced (features, labels) pair.

use std::fmt;
use std::str::FromStr;

use ndarray::{concatenate, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{class_counts, Features, Labels};
use crate::logic::error::{CoreError, CoreResult};

/// Neighbours considered when interpolating synthetic samples
const SMOTE_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    #[default]
    None,
    Oversample,
    Undersample,
    Smote,
}

impl Resampling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Oversample => "oversample",
            Self::Undersample => "undersample",
            Self::Smote => "smote",
        }
    }
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resampling {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "oversample" => Ok(Self::Oversample),
            "undersample" => Ok(Self::Undersample),
            "smote" => Ok(Self::Smote),
            other => Err(CoreError::InvalidValue(format!(
                "unknown resampling method: {}",
                other
            ))),
        }
    }
}

/// Rebalance the training set with the given method
pub fn resample(
    x: &Features,
    y: &[u8],
    method: Resampling,
    random_state: u64,
) -> CoreResult<(Features, Labels)> {
    let counts = class_counts(y);
    if method != Resampling::None && (counts[0] == 0 || counts[1] == 0) {
        return Err(CoreError::InvalidValue(
            "resampling requires both classes to be present".to_string(),
        ));
    }

    let minority: u8 = if counts[1] <= counts[0] { 1 } else { 0 };
    let minority_idx: Vec<usize> = indices_of(y, minority);
    let majority_idx: Vec<usize> = indices_of(y, 1 - minority);
    let mut rng = StdRng::seed_from_u64(random_state);

    let (features, labels) = match method {
        Resampling::None => (x.clone(), y.to_vec()),
        Resampling::Oversample => {
            let mut idx: Vec<usize> = (0..y.len()).collect();
            for _ in 0..(majority_idx.len() - minority_idx.len()) {
                idx.push(minority_idx[rng.gen_range(0..minority_idx.len())]);
            }
            let labels = idx.iter().map(|&i| y[i]).collect();
            (x.select(&idx), labels)
        }
        Resampling::Undersample => {
            let mut idx: Vec<usize> =
                rand::seq::index::sample(&mut rng, majority_idx.len(), minority_idx.len())
                    .into_iter()
                    .map(|k| majority_idx[k])
                    .collect();
            idx.extend_from_slice(&minority_idx);
            idx.sort_unstable();
            let labels = idx.iter().map(|&i| y[i]).collect();
            (x.select(&idx), labels)
        }
        Resampling::Smote => smote(x, y, &minority_idx, majority_idx.len(), minority, &mut rng)?,
    };

    let [legit, fraud] = class_counts(&labels);
    log::info!(
        "After {} resampling: {} samples ({} legitimate, {} fraud)",
        method,
        labels.len(),
        legit,
        fraud
    );

    Ok((features, labels))
}

fn indices_of(y: &[u8], class: u8) -> Vec<usize> {
    y.iter()
        .enumerate()
        .filter(|(_, &l)| l == class)
        .map(|(i, _)| i)
        .collect()
}

fn smote(
    x: &Features,
    y: &[u8],
    minority_idx: &[usize],
    target_count: usize,
    minority: u8,
    rng: &mut StdRng,
) -> CoreResult<(Features, Labels)> {
    let k = SMOTE_K.min(minority_idx.len().saturating_sub(1));
    if k == 0 {
        return Err(CoreError::InvalidValue(
            "smote needs at least 2 minority samples".to_string(),
        ));
    }

    let neighbours: Vec<Vec<usize>> = minority_idx
        .iter()
        .map(|&i| nearest(x, i, minority_idx, k))
        .collect();

    let n_new = target_count - minority_idx.len();
    let n_features = x.n_features();
    let mut flat = Vec::with_capacity(n_new * n_features);

    for _ in 0..n_new {
        let pick = rng.gen_range(0..minority_idx.len());
        let base = x.values.row(minority_idx[pick]);
        let other = x.values.row(neighbours[pick][rng.gen_range(0..k)]);
        let gap: f64 = rng.gen();
        flat.extend(base.iter().zip(other.iter()).map(|(&a, &b)| a + gap * (b - a)));
    }

    let synthetic = Array2::from_shape_vec((n_new, n_features), flat)
        .map_err(|e| CoreError::InvalidValue(e.to_string()))?;
    let values = concatenate(Axis(0), &[x.values.view(), synthetic.view()])
        .map_err(|e| CoreError::InvalidValue(e.to_string()))?;

    let mut labels = y.to_vec();
    labels.extend(std::iter::repeat(minority).take(n_new));

    Ok((Features::new(x.names.clone(), values), labels))
}

/// Indices of the `k` closest minority rows to row `i` (squared euclidean)
fn nearest(x: &Features, i: usize, candidates: &[usize], k: usize) -> Vec<usize> {
    let row = x.values.row(i);
    let mut dists: Vec<(f64, usize)> = candidates
        .iter()
        .filter(|&&j| j != i)
        .map(|&j| {
            let d = row
                .iter()
                .zip(x.values.row(j).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
            (d, j)
        })
        .collect();
    dists.sort_by(|a, b| a.0.total_cmp(&b.0));
    dists.into_iter().take(k).map(|(_, j)| j).collect()
}
