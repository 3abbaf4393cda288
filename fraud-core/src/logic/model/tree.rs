//! Decision Tree - weighted CART with Gini impurity
//!
//! Nodes live in a flat arena; children are referenced by index.
//! Each split considers a random subset of `max_features` columns.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Gains at or below this are treated as no improvement
const MIN_GAIN: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Class distribution (legitimate, fraud), sums to 1
    Leaf { distribution: [f64; 2] },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Normalized impurity decrease per feature
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [u8],
    weights: &'a [f64],
    params: TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Fit on rows with a positive weight
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[u8],
        weights: &[f64],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let samples: Vec<usize> = (0..x.nrows()).filter(|&i| weights[i] > 0.0).collect();

        let mut builder = Builder {
            x: x.view(),
            y,
            weights,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        builder.build(samples, 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        Self {
            nodes: builder.nodes,
            importances,
        }
    }

    /// Class distribution of the leaf reached by `row`
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return *distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

impl Builder<'_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let totals = self.class_totals(&samples);
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: normalize(totals),
        });

        let n = samples.len();
        let impurity = gini(totals);
        let depth_reached = self.params.max_depth.map_or(false, |max| depth >= max);
        if depth_reached
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || impurity <= MIN_GAIN
        {
            return idx;
        }

        let Some(split) = self.best_split(&samples, totals, impurity) else {
            return idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, split.feature]] <= split.threshold);

        self.importances[split.feature] += split.gain;

        let left_idx = self.build(left, depth + 1);
        let right_idx = self.build(right, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    fn class_totals(&self, samples: &[usize]) -> [f64; 2] {
        let mut totals = [0.0; 2];
        for &i in samples {
            totals[self.y[i] as usize] += self.weights[i];
        }
        totals
    }

    fn best_split(&mut self, samples: &[usize], totals: [f64; 2], impurity: f64) -> Option<SplitCandidate> {
        let n = samples.len();
        let n_features = self.x.ncols();
        let k = self.params.max_features.clamp(1, n_features);
        let candidates = rand::seq::index::sample(self.rng, n_features, k).into_vec();

        let total_weight = totals[0] + totals[1];
        let min_leaf = self.params.min_samples_leaf;
        let mut order = samples.to_vec();
        let mut best: Option<SplitCandidate> = None;

        for feature in candidates {
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left = [0.0; 2];
            for pos in 0..n - 1 {
                let i = order[pos];
                left[self.y[i] as usize] += self.weights[i];

                let n_left = pos + 1;
                if n_left < min_leaf || n - n_left < min_leaf {
                    continue;
                }

                let current = self.x[[i, feature]];
                let next = self.x[[order[pos + 1], feature]];
                if next <= current {
                    continue;
                }

                let right = [totals[0] - left[0], totals[1] - left[1]];
                let w_left = left[0] + left[1];
                let w_right = right[0] + right[1];
                if w_left <= 0.0 || w_right <= 0.0 {
                    continue;
                }

                let gain = total_weight * impurity - w_left * gini(left) - w_right * gini(right);
                if gain > best.as_ref().map_or(MIN_GAIN, |b| b.gain) {
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Gini impurity of weighted class totals
fn gini(totals: [f64; 2]) -> f64 {
    let total = totals[0] + totals[1];
    if total <= 0.0 {
        return 0.0;
    }
    let p0 = totals[0] / total;
    let p1 = totals[1] / total;
    1.0 - p0 * p0 - p1 * p1
}

fn normalize(totals: [f64; 2]) -> [f64; 2] {
    let total = totals[0] + totals[1];
    if total <= 0.0 {
        return [0.5, 0.5];
    }
    [totals[0] / total, 1.0 - totals[0] / total]
}
