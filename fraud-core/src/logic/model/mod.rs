//! Model Module - Random forest classifier for fraud detection
//!
//! tree → forest → wrapper. Metrics and artifact storage sit alongside.
//! Callers only need `FraudDetectionModel` and `ForestParams`.

pub mod artifact;
pub mod forest;
pub mod metrics;
pub mod params;
pub mod tree;
pub mod wrapper;


// Re-export common types
pub use artifact::{read_header, ArtifactHeader, ARTIFACT_FORMAT_VERSION};
pub use forest::{decide, RandomForest};
pub use metrics::{roc_auc, ClassificationMetrics, ConfusionMatrix};
pub use params::{ClassWeight, ForestParams};
pub use wrapper::FraudDetectionModel;
