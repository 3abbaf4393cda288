//! Fraud Detection Core
//!
//! Dataset handling, random forest training, experiment tracking and
//! hyperparameter search for the credit-card fraud model. The serving
//! layer depends on this crate for the model and its feature contract.

pub mod constants;
pub mod logic;

pub use logic::config::ProjectConfig;
pub use logic::data::{Features, Labels};
pub use logic::error::{CoreError, CoreResult, ErrorKind};
pub use logic::model::{decide, ClassWeight, ForestParams, FraudDetectionModel};
pub use logic::tracking::{ExperimentTracker, JsonlTracker, MemoryTracker, NoopTracker};
