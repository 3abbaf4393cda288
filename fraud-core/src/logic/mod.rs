//! Logic Module - Data, model, training and search engines
//!
//! ## Layout
//! - `data/` - CSV loading, stratified split, scaling, resampling
//! - `model/` - Random forest, metrics, artifact storage
//! - `tracking/` - Experiment tracking (JSONL)
//! - `pipeline/` - Training orchestration and preset experiments
//! - `optimize/` - Hyperparameter search

pub mod config;
pub mod error;

pub mod data;
pub mod model;
pub mod optimize;
pub mod pipeline;
pub mod tracking;

#[cfg(test)]
pub(crate) mod test_support;
