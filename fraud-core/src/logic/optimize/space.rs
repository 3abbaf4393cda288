//! Search Space
//!
//! Stepped integer ranges and a categorical class-weight choice.
//! The seed is fixed, not searched.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RANDOM_STATE;
use crate::logic::error::{CoreError, CoreResult};
use crate::logic::model::{ClassWeight, ForestParams};

/// Inclusive integer range `low..=high` walked in `step` increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub low: usize,
    pub high: usize,
    pub step: usize,
}

impl IntRange {
    pub const fn new(low: usize, high: usize, step: usize) -> Self {
        Self { low, high, step }
    }

    /// Number of distinct values
    pub fn n_values(&self) -> usize {
        (self.high - self.low) / self.step + 1
    }

    pub fn contains(&self, value: usize) -> bool {
        value >= self.low && value <= self.high && (value - self.low) % self.step == 0
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.low + self.step * rng.gen_range(0..self.n_values())
    }

    fn validate(&self, name: &str) -> CoreResult<()> {
        if self.step == 0 || self.low > self.high {
            return Err(CoreError::InvalidValue(format!(
                "search range {} = {}..={} step {} is empty",
                name, self.low, self.high, self.step
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub n_estimators: IntRange,
    pub max_depth: IntRange,
    pub min_samples_split: IntRange,
    pub min_samples_leaf: IntRange,
    pub class_weight: Vec<ClassWeight>,
    pub random_state: u64,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: IntRange::new(50, 300, 50),
            max_depth: IntRange::new(5, 30, 5),
            min_samples_split: IntRange::new(2, 10, 1),
            min_samples_leaf: IntRange::new(1, 5, 1),
            class_weight: vec![ClassWeight::Balanced, ClassWeight::None],
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

impl SearchSpace {
    pub fn validate(&self) -> CoreResult<()> {
        self.n_estimators.validate("n_estimators")?;
        self.max_depth.validate("max_depth")?;
        self.min_samples_split.validate("min_samples_split")?;
        self.min_samples_leaf.validate("min_samples_leaf")?;
        if self.class_weight.is_empty() {
            return Err(CoreError::InvalidValue(
                "search space has no class_weight choices".to_string(),
            ));
        }
        Ok(())
    }

    /// Draw one candidate
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators.sample(rng),
            max_depth: Some(self.max_depth.sample(rng)),
            min_samples_split: self.min_samples_split.sample(rng),
            min_samples_leaf: self.min_samples_leaf.sample(rng),
            class_weight: self.class_weight[rng.gen_range(0..self.class_weight.len())],
            random_state: Some(self.random_state),
        }
    }

    pub fn contains(&self, params: &ForestParams) -> bool {
        self.n_estimators.contains(params.n_estimators)
            && params.max_depth.map_or(false, |d| self.max_depth.contains(d))
            && self.min_samples_split.contains(params.min_samples_split)
            && self.min_samples_leaf.contains(params.min_samples_leaf)
            && self.class_weight.contains(&params.class_weight)
            && params.random_state == Some(self.random_state)
    }
}
