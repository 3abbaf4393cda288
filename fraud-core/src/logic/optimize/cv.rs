//! Stratified K-Fold Cross-Validation
//!
//! Folds are built per class from contiguous chunks (no shuffling), so each
//! fold keeps roughly the source class ratio.

use crate::logic::data::Features;
use crate::logic::error::{CoreError, CoreResult};
use crate::logic::model::{ClassificationMetrics, ForestParams, FraudDetectionModel};

/// Validation-row indices of each fold, in row order
pub fn stratified_kfold(y: &[u8], k: usize) -> CoreResult<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(CoreError::InvalidValue(format!("cv folds must be >= 2, got {}", k)));
    }
    if y.len() < k {
        return Err(CoreError::InvalidValue(format!(
            "cannot split {} samples into {} folds",
            y.len(),
            k
        )));
    }

    let mut folds = vec![Vec::new(); k];
    for class in [0u8, 1u8] {
        let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
        if !members.is_empty() && members.len() < k {
            log::warn!(
                "class {} has {} members, fewer than {} folds",
                class,
                members.len(),
                k
            );
        }

        // First `n % k` folds take one extra member
        let base = members.len() / k;
        let extra = members.len() % k;
        let mut start = 0;
        for (fold, indices) in folds.iter_mut().enumerate() {
            let size = base + usize::from(fold < extra);
            indices.extend_from_slice(&members[start..start + size]);
            start += size;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

/// F1 of each fold for a model built from `params`
pub fn cross_val_f1(x: &Features, y: &[u8], params: &ForestParams, k: usize) -> CoreResult<Vec<f64>> {
    let folds = stratified_kfold(y, k)?;
    let mut scores = Vec::with_capacity(k);

    for (i, val_idx) in folds.iter().enumerate() {
        let mut in_val = vec![false; y.len()];
        for &j in val_idx {
            in_val[j] = true;
        }
        let train_idx: Vec<usize> = (0..y.len()).filter(|&j| !in_val[j]).collect();

        let y_train: Vec<u8> = train_idx.iter().map(|&j| y[j]).collect();
        let y_val: Vec<u8> = val_idx.iter().map(|&j| y[j]).collect();

        let mut model = FraudDetectionModel::new(params.clone());
        model.train(&x.select(&train_idx), &y_train)?;
        let metrics: ClassificationMetrics = model.evaluate(&x.select(val_idx), &y_val)?;

        log::debug!("fold {}/{}: f1 {:.4}", i + 1, k, metrics.f1_score);
        scores.push(metrics.f1_score);
    }

    Ok(scores)
}

/// Mean and population standard deviation
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_rows() {
        let y = [0, 0, 0, 0, 0, 0, 1, 1, 1, 0];
        let folds = stratified_kfold(&y, 3).unwrap();

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        // 7 legitimate → 3/2/2, 3 fraud → 1/1/1
        for fold in &folds {
            assert_eq!(fold.iter().filter(|&&i| y[i] == 1).count(), 1);
        }
        assert_eq!(folds[0], vec![0, 1, 2, 6]);
    }

    #[test]
    fn test_too_few_samples() {
        assert!(stratified_kfold(&[0, 1], 3).is_err());
        assert!(stratified_kfold(&[0, 1, 0], 1).is_err());
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[0.5, 0.7, 0.9]);
        assert!((mean - 0.7).abs() < 1e-12);
        assert!((std - (0.08f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }
}
