//! Fraud Detection Model
//!
//! Owns a random forest and the hyperparameters it was built with.
//! The model starts untrained; every inference call on an untrained
//! model fails with `CoreError::NotTrained`.

use std::path::Path;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::artifact::{read_artifact, write_artifact, ArtifactHeader};
use super::forest::{decide, RandomForest};
use super::metrics::{ClassificationMetrics, ConfusionMatrix};
use super::params::ForestParams;
use crate::logic::data::Features;
use crate::logic::error::{CoreError, CoreResult};

/// Persisted part of a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrainedState {
    forest: RandomForest,
    feature_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FraudDetectionModel {
    params: ForestParams,
    state: Option<TrainedState>,
}

impl Default for FraudDetectionModel {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl FraudDetectionModel {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Feature count seen at training time
    pub fn n_features(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.forest.n_features())
    }

    /// Column names seen at training time
    pub fn feature_names(&self) -> Option<&[String]> {
        self.state.as_ref().map(|s| s.feature_names.as_slice())
    }

    /// Fit on `x`/`y`, replacing any previous fit
    pub fn train(&mut self, x: &Features, y: &[u8]) -> CoreResult<()> {
        log::info!(
            "Training random forest ({} trees, max_depth {:?}, class_weight {}) on {} samples",
            self.params.n_estimators,
            self.params.max_depth,
            self.params.class_weight,
            x.n_samples()
        );

        let forest = RandomForest::fit(x.values.view(), y, &self.params)?;
        self.state = Some(TrainedState {
            forest,
            feature_names: x.names.clone(),
        });

        log::info!("Training completed");
        Ok(())
    }

    fn forest(&self) -> CoreResult<&RandomForest> {
        self.state
            .as_ref()
            .map(|s| &s.forest)
            .ok_or(CoreError::NotTrained)
    }

    /// Class probabilities, one `[p_legit, p_fraud]` row per sample
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> CoreResult<Array2<f64>> {
        self.forest()?.predict_proba(x)
    }

    /// Score loose feature vectors (the serving path)
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> CoreResult<Vec<[f64; 2]>> {
        let state = self.state.as_ref().ok_or(CoreError::NotTrained)?;
        let x = Features::from_rows(state.feature_names.clone(), rows)?;
        let proba = state.forest.predict_proba(x.values.view())?;
        Ok(proba.outer_iter().map(|row| [row[0], row[1]]).collect())
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> CoreResult<Vec<u8>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .outer_iter()
            .map(|row| decide([row[0], row[1]]))
            .collect())
    }

    pub fn evaluate(&self, x: &Features, y: &[u8]) -> CoreResult<ClassificationMetrics> {
        check_lengths(x, y)?;
        let proba = self.predict_proba(x.values.view())?;
        let predicted: Vec<u8> = proba
            .outer_iter()
            .map(|row| decide([row[0], row[1]]))
            .collect();
        let scores: Vec<f64> = proba.column(1).to_vec();

        let metrics = ClassificationMetrics::compute(y, &predicted, &scores);
        log::info!(
            "Evaluation: accuracy {:.4}, precision {:.4}, recall {:.4}, f1 {:.4}, roc_auc {:.4}",
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1_score,
            metrics.roc_auc
        );
        Ok(metrics)
    }

    pub fn confusion_matrix(&self, x: &Features, y: &[u8]) -> CoreResult<ConfusionMatrix> {
        check_lengths(x, y)?;
        let predicted = self.predict(x.values.view())?;
        Ok(ConfusionMatrix::from_labels(y, &predicted))
    }

    /// (feature, importance) pairs sorted by importance, descending
    pub fn feature_importance(&self, names: &[String]) -> CoreResult<Vec<(String, f64)>> {
        let forest = self.forest()?;
        if names.len() != forest.n_features() {
            return Err(CoreError::State(format!(
                "{} feature names given for a model trained on {} features",
                names.len(),
                forest.n_features()
            )));
        }

        let mut table: Vec<(String, f64)> = names
            .iter()
            .cloned()
            .zip(forest.feature_importances())
            .collect();
        table.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> CoreResult<ArtifactHeader> {
        let state = self.state.as_ref().ok_or(CoreError::NotTrained)?;
        let header = write_artifact(path, state.forest.n_features(), &self.params, state)?;
        log::info!("Model saved: {}", path.display());
        Ok(header)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let (header, state): (ArtifactHeader, TrainedState) = read_artifact(path)?;
        if state.forest.n_features() != header.n_features {
            return Err(CoreError::Artifact(format!(
                "header declares {} features, payload has {}",
                header.n_features,
                state.forest.n_features()
            )));
        }

        log::info!(
            "Model loaded: {} ({} features, created {})",
            path.display(),
            header.n_features,
            header.created_at
        );
        Ok(Self {
            params: header.params,
            state: Some(state),
        })
    }
}

fn check_lengths(x: &Features, y: &[u8]) -> CoreResult<()> {
    if x.n_samples() != y.len() {
        return Err(CoreError::InvalidValue(format!(
            "{} feature rows but {} labels",
            x.n_samples(),
            y.len()
        )));
    }
    Ok(())
}
