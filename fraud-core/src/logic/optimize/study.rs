//! Study - random-sampling hyperparameter search
//!
//! Trials are independent: each samples a candidate, scores it with the
//! objective and records the outcome. Failed trials are kept for reporting
//! but never win.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::cv::mean_std;
use super::space::SearchSpace;
use crate::constants::{DEFAULT_CV_FOLDS, DEFAULT_N_TRIALS, DEFAULT_RANDOM_STATE};
use crate::logic::error::{CoreError, CoreResult};
use crate::logic::model::ForestParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialState {
    Complete,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial {
    pub number: usize,
    pub params: ForestParams,
    pub state: TrialState,
    /// Mean cross-validated F1 (complete trials only)
    pub mean_f1: Option<f64>,
    pub std_f1: Option<f64>,
    pub error: Option<String>,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyConfig {
    pub n_trials: usize,
    pub cv_folds: usize,
    /// Seed for candidate sampling
    pub seed: u64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            n_trials: DEFAULT_N_TRIALS,
            cv_folds: DEFAULT_CV_FOLDS,
            seed: DEFAULT_RANDOM_STATE,
        }
    }
}

impl StudyConfig {
    pub fn with_n_trials(mut self, n_trials: usize) -> Self {
        self.n_trials = n_trials;
        self
    }

    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

pub struct Study {
    config: StudyConfig,
    space: SearchSpace,
    trials: Vec<Trial>,
}

impl Study {
    pub fn new(config: StudyConfig, space: SearchSpace) -> CoreResult<Self> {
        space.validate()?;
        if config.n_trials == 0 {
            return Err(CoreError::InvalidValue("n_trials must be >= 1".to_string()));
        }
        Ok(Self {
            config,
            space,
            trials: Vec::new(),
        })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Run every trial; `objective` returns the per-fold scores of a candidate
    /// and `on_trial` sees each finished trial
    pub fn optimize<F, C>(&mut self, mut objective: F, mut on_trial: C) -> CoreResult<&Trial>
    where
        F: FnMut(&ForestParams) -> CoreResult<Vec<f64>>,
        C: FnMut(&Trial),
    {
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        for number in 0..self.config.n_trials {
            let params = self.space.sample(&mut rng);
            let started = Instant::now();
            let result = objective(&params);
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            let trial = match result {
                Ok(scores) => {
                    let (mean, std) = mean_std(&scores);
                    log::info!(
                        "Trial {} finished: f1 {:.4} (+/- {:.4}) with {:?}",
                        number,
                        mean,
                        std,
                        params
                    );
                    Trial {
                        number,
                        params,
                        state: TrialState::Complete,
                        mean_f1: Some(mean),
                        std_f1: Some(std),
                        error: None,
                        duration_ms,
                    }
                }
                Err(e) => {
                    log::warn!("Trial {} failed: {}", number, e);
                    Trial {
                        number,
                        params,
                        state: TrialState::Failed,
                        mean_f1: None,
                        std_f1: None,
                        error: Some(e.to_string()),
                        duration_ms,
                    }
                }
            };

            on_trial(&trial);
            self.trials.push(trial);
        }

        self.best_trial().ok_or_else(|| {
            CoreError::Optimization(format!(
                "none of {} trials completed",
                self.config.n_trials
            ))
        })
    }

    /// Highest mean F1 among complete trials; earliest wins ties
    pub fn best_trial(&self) -> Option<&Trial> {
        let mut best: Option<&Trial> = None;
        for trial in &self.trials {
            let Some(score) = trial.mean_f1 else { continue };
            if best.and_then(|b| b.mean_f1).map_or(true, |b| score > b) {
                best = Some(trial);
            }
        }
        best
    }

    pub fn n_complete(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| t.state == TrialState::Complete)
            .count()
    }
}
