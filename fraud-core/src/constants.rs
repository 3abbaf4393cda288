//! Central Configuration Constants
//!
//! Single source of truth for the transaction schema and training defaults.

/// Feature names in exact order they appear in a transaction vector
/// This is the SINGLE SOURCE OF TRUTH for the serving contract
pub const FEATURE_NAMES: &[&str] = &[
    // === Anonymized principal components (0-27) ===
    "V1", "V2", "V3", "V4", "V5", "V6", "V7",
    "V8", "V9", "V10", "V11", "V12", "V13", "V14",
    "V15", "V16", "V17", "V18", "V19", "V20", "V21",
    "V22", "V23", "V24", "V25", "V26", "V27", "V28",

    // === Raw amount (28) ===
    "Amount",
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_NAMES.len()!
pub const FEATURE_COUNT: usize = 29;

/// Label column in the raw CSV
pub const TARGET_COLUMN: &str = "Class";

/// Columns present in the raw CSV that are not model inputs
pub const DEFAULT_DROP_COLUMNS: &[&str] = &["Time"];

/// Held-out fraction for the stratified split
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Seed used everywhere a run must be reproducible
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Minimum F1 on the test set before an artifact is persisted
pub const DEFAULT_SAVE_THRESHOLD: f64 = 0.80;

/// Artifact file stem prefix
pub const DEFAULT_MODEL_NAME: &str = "fraud_model";

/// Artifact file extension
pub const ARTIFACT_EXT: &str = "model";

/// Default trial budget for the hyperparameter search
pub const DEFAULT_N_TRIALS: usize = 10;

/// Folds used to score one search trial
pub const DEFAULT_CV_FOLDS: usize = 3;

/// Model family reported by artifacts and the serving API
pub const MODEL_TYPE: &str = "RandomForestClassifier";

/// Core version
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the index of a feature by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// Owned copy of the feature names (for tables and API payloads)
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}
