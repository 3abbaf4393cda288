//! Classification metrics
//!
//! Accuracy, precision, recall, F1 and ROC-AUC for the fraud class.
//! Zero denominators yield 0.0 instead of an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 2x2 confusion table, rows = actual, columns = predicted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (0, 0) => cm.true_negative += 1,
                (0, _) => cm.false_positive += 1,
                (_, 0) => cm.false_negative += 1,
                _ => cm.true_positive += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn as_table(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
}

impl ClassificationMetrics {
    /// Compute every metric from labels, hard predictions and fraud scores
    pub fn compute(actual: &[u8], predicted: &[u8], scores: &[f64]) -> Self {
        let cm = ConfusionMatrix::from_labels(actual, predicted);
        let tp = cm.true_positive as f64;

        let accuracy = ratio((cm.true_positive + cm.true_negative) as f64, cm.total() as f64);
        let precision = ratio(tp, (cm.true_positive + cm.false_positive) as f64);
        let recall = ratio(tp, (cm.true_positive + cm.false_negative) as f64);
        let f1_score = ratio(2.0 * precision * recall, precision + recall);

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            roc_auc: roc_auc(actual, scores),
        }
    }

    /// Metric name → value, in a stable order
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("accuracy".to_string(), self.accuracy),
            ("precision".to_string(), self.precision),
            ("recall".to_string(), self.recall),
            ("f1_score".to_string(), self.f1_score),
            ("roc_auc".to_string(), self.roc_auc),
        ])
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Area under the ROC curve via the rank-sum statistic (ties get average rank)
///
/// Returns 0.5 when only one class is present.
pub fn roc_auc(actual: &[u8], scores: &[f64]) -> f64 {
    let n_pos = actual.iter().filter(|&&l| l == 1).count();
    let n_neg = actual.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        log::warn!("ROC-AUC undefined with a single class present, reporting 0.5");
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; positions i..=j share their mean
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            if actual[k] == 1 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = [0, 0, 1, 1];
        let m = ClassificationMetrics::compute(&y, &y, &[0.1, 0.2, 0.8, 0.9]);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
        assert_eq!(m.roc_auc, 1.0);
    }

    #[test]
    fn test_no_positive_predictions_gives_zero_f1() {
        let actual = [0, 0, 1, 1];
        let predicted = [0, 0, 0, 0];
        let m = ClassificationMetrics::compute(&actual, &predicted, &[0.1, 0.1, 0.1, 0.1]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.accuracy, 0.5);
        // All scores tied
        assert_eq!(m.roc_auc, 0.5);
    }

    #[test]
    fn test_partial_scores() {
        let actual = [0, 1, 0, 1];
        let predicted = [0, 1, 1, 1];
        let m = ClassificationMetrics::compute(&actual, &predicted, &[0.1, 0.9, 0.6, 0.4]);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.recall, 1.0);
        assert!((m.f1_score - 0.8).abs() < 1e-12);
        // Pairs (pos, neg): (0.9>0.1), (0.9>0.6), (0.4>0.1), (0.4<0.6) → 3/4
        assert!((m.roc_auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_auc() {
        assert_eq!(roc_auc(&[0, 0, 0], &[0.1, 0.5, 0.9]), 0.5);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 1, 1, 1], &[0, 1, 0, 1, 1]);
        assert_eq!(cm.as_table(), [[1, 1], [1, 2]]);
        assert_eq!(cm.total(), 5);
    }
}
