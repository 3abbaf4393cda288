//! CSV Loader
//!
//! Reads the labeled transaction table and separates features from the target.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::Array2;
use serde::Serialize;

use super::{class_counts, Features, Labels, RawDataset};
use crate::logic::error::{CoreError, CoreResult};

/// Summary statistics for a raw dataset
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasetInfo {
    pub n_samples: usize,
    pub n_columns: usize,
    pub n_fraud: Option<usize>,
    pub fraud_percentage: Option<f64>,
    pub duplicates: usize,
}

/// Load the raw dataset from a CSV file
pub fn load_raw_data<P: AsRef<Path>>(path: P) -> CoreResult<RawDataset> {
    let path = path.as_ref();
    log::info!("Loading data from: {}", path.display());

    let file = File::open(path)?;
    let dataset = read_csv(file)?;

    log::info!(
        "Data loaded: {} rows, {} columns",
        dataset.n_rows(),
        dataset.columns.len()
    );
    Ok(dataset)
}

/// Parse a CSV stream with a header row into a numeric table
pub fn read_csv<R: Read>(source: R) -> CoreResult<RawDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(CoreError::Malformed("missing header row".to_string()));
    }

    let mut flat = Vec::new();
    let mut n_rows = 0usize;

    for record in reader.records() {
        let record = record?;
        for (col, field) in record.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| {
                CoreError::Malformed(format!(
                    "row {}, column '{}': '{}' is not numeric",
                    n_rows + 1,
                    columns[col],
                    field
                ))
            })?;
            if !value.is_finite() {
                return Err(CoreError::Malformed(format!(
                    "row {}, column '{}': non-finite value",
                    n_rows + 1,
                    columns[col]
                )));
            }
            flat.push(value);
        }
        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(CoreError::Malformed("no data rows".to_string()));
    }

    let values = Array2::from_shape_vec((n_rows, columns.len()), flat)
        .map_err(|e| CoreError::Malformed(e.to_string()))?;

    Ok(RawDataset { columns, values })
}

/// Split a raw table into features and binary labels
///
/// Columns named in `drop` are removed when present and ignored otherwise.
pub fn split_features_target(
    dataset: &RawDataset,
    target: &str,
    drop: &[&str],
) -> CoreResult<(Features, Labels)> {
    let target_idx = dataset
        .column_index(target)
        .ok_or_else(|| CoreError::MissingColumn(target.to_string()))?;

    let keep: Vec<usize> = (0..dataset.columns.len())
        .filter(|&i| i != target_idx && !drop.contains(&dataset.columns[i].as_str()))
        .collect();

    let labels = dataset
        .values
        .column(target_idx)
        .iter()
        .enumerate()
        .map(|(row, &v)| {
            if v == 0.0 {
                Ok(0u8)
            } else if v == 1.0 {
                Ok(1u8)
            } else {
                Err(CoreError::InvalidValue(format!(
                    "label {} at row {} is not 0 or 1",
                    v,
                    row + 1
                )))
            }
        })
        .collect::<CoreResult<Labels>>()?;

    let names = keep.iter().map(|&i| dataset.columns[i].clone()).collect();
    let values = dataset.values.select(ndarray::Axis(1), &keep);
    let features = Features::new(names, values);

    let [legit, fraud] = class_counts(&labels);
    log::info!(
        "Features shape: ({}, {}) | target: {} legitimate, {} fraud",
        features.n_samples(),
        features.n_features(),
        legit,
        fraud
    );

    Ok((features, labels))
}

/// Dataset statistics (fraud figures are `None` when the target column is absent)
pub fn dataset_info(dataset: &RawDataset, target: &str) -> DatasetInfo {
    let n_samples = dataset.n_rows();

    let (n_fraud, fraud_percentage) = match dataset.column_index(target) {
        Some(idx) => {
            let fraud = dataset.values.column(idx).iter().filter(|&&v| v == 1.0).count();
            let pct = if n_samples > 0 {
                fraud as f64 / n_samples as f64 * 100.0
            } else {
                0.0
            };
            (Some(fraud), Some(pct))
        }
        None => (None, None),
    };

    let mut seen = HashSet::with_capacity(n_samples);
    let mut duplicates = 0;
    for row in dataset.values.rows() {
        let key: Vec<u64> = row.iter().map(|v| v.to_bits()).collect();
        if !seen.insert(key) {
            duplicates += 1;
        }
    }

    DatasetInfo {
        n_samples,
        n_columns: dataset.columns.len(),
        n_fraud,
        fraud_percentage,
        duplicates,
    }
}
