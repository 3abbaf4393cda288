//! Random Forest - bagged CART ensemble
//!
//! Each tree gets its own bootstrap sample and RNG seeded from the forest seed,
//! so a fixed `random_state` reproduces the exact same forest regardless of
//! how rayon schedules the fits.

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::params::ForestParams;
use super::tree::{DecisionTree, TreeParams};
use crate::logic::error::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

/// Seed for tree `t` derived from the forest seed
fn tree_seed(base: u64, t: usize) -> u64 {
    base.wrapping_mul(1_000_003).wrapping_add(t as u64)
}

impl RandomForest {
    pub fn fit(x: ArrayView2<'_, f64>, y: &[u8], params: &ForestParams) -> CoreResult<Self> {
        params.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 || n_features == 0 {
            return Err(CoreError::InvalidValue(format!(
                "cannot fit on a {}x{} matrix",
                n_samples, n_features
            )));
        }
        if y.len() != n_samples {
            return Err(CoreError::InvalidValue(format!(
                "{} feature rows but {} labels",
                n_samples,
                y.len()
            )));
        }
        if let Some(bad) = y.iter().find(|&&l| l > 1) {
            return Err(CoreError::InvalidValue(format!("label {} is not 0 or 1", bad)));
        }

        let class_weights = params.class_weight.weights(y);
        let base_seed = params
            .random_state
            .unwrap_or_else(|| rand::thread_rng().gen());

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(base_seed, t));

                // Bootstrap draw counts become sample weights
                let mut weights = vec![0.0; n_samples];
                for _ in 0..n_samples {
                    weights[rng.gen_range(0..n_samples)] += 1.0;
                }
                for (w, &label) in weights.iter_mut().zip(y) {
                    *w *= class_weights[label as usize];
                }

                DecisionTree::fit(x, y, &weights, tree_params, &mut rng)
            })
            .collect();

        log::debug!(
            "Fitted forest: {} trees, {} features, {} samples",
            trees.len(),
            n_features,
            n_samples
        );

        Ok(Self { trees, n_features })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean leaf distribution over all trees, one `[p_legit, p_fraud]` row per sample
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> CoreResult<Array2<f64>> {
        if x.ncols() != self.n_features {
            return Err(CoreError::FeatureCountMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }

        let n_trees = self.trees.len() as f64;
        let rows: Vec<[f64; 2]> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let mut sum = [0.0; 2];
                for tree in &self.trees {
                    let d = tree.predict_row(x.row(i));
                    sum[0] += d[0];
                    sum[1] += d[1];
                }
                [sum[0] / n_trees, sum[1] / n_trees]
            })
            .collect();

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((x.nrows(), 2), flat)
            .map_err(|e| CoreError::InvalidValue(e.to_string()))
    }

    /// Impurity-decrease importances averaged over trees, summing to 1
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, &v) in total.iter_mut().zip(tree.importances()) {
                *acc += v;
            }
        }

        let sum: f64 = total.iter().sum();
        if sum <= 0.0 {
            // Every tree is a single leaf
            return vec![1.0 / self.n_features as f64; self.n_features];
        }
        total.iter().map(|v| v / sum).collect()
    }
}

/// Predicted class for a probability row: fraud iff it is strictly more likely
pub fn decide(proba: [f64; 2]) -> u8 {
    u8::from(proba[1] > proba[0])
}
