//! Error handling primitives shared across the core.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification used by callers that map errors to user-visible codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied malformed input
    Validation,
    /// Operation not allowed in the current state
    State,
    /// Dataset or artifact could not be read or written
    Io,
    /// Anything else
    Internal,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed dataset: {0}")]
    Malformed(String),

    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("model must be trained before prediction")]
    NotTrained,

    #[error("{0}")]
    State(String),

    #[error("expected {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("unknown model configuration '{0}'")]
    UnknownPreset(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("optimization failed: {0}")]
    Optimization(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidValue(_)
            | CoreError::MissingColumn(_)
            | CoreError::FeatureCountMismatch { .. }
            | CoreError::UnknownPreset(_) => ErrorKind::Validation,
            CoreError::NotTrained | CoreError::State(_) => ErrorKind::State,
            CoreError::Io(_)
            | CoreError::Csv(_)
            | CoreError::Malformed(_)
            | CoreError::Artifact(_) => ErrorKind::Io,
            CoreError::Serialization(_) | CoreError::Config(_) | CoreError::Optimization(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}
