//! Tracking Event Types
//!
//! One record per tracker call, serialized as a JSONL line.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier of one tracked run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Finished,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackingEvent {
    RunStarted {
        run_id: RunId,
        experiment: String,
        run_name: String,
        timestamp: DateTime<Utc>,
    },
    Param {
        run_id: RunId,
        key: String,
        value: Value,
    },
    Metric {
        run_id: RunId,
        key: String,
        value: f64,
        timestamp: DateTime<Utc>,
    },
    Artifact {
        run_id: RunId,
        path: String,
    },
    RunEnded {
        run_id: RunId,
        status: RunStatus,
        timestamp: DateTime<Utc>,
    },
}

impl TrackingEvent {
    pub fn run_id(&self) -> &RunId {
        match self {
            TrackingEvent::RunStarted { run_id, .. }
            | TrackingEvent::Param { run_id, .. }
            | TrackingEvent::Metric { run_id, .. }
            | TrackingEvent::Artifact { run_id, .. }
            | TrackingEvent::RunEnded { run_id, .. } => run_id,
        }
    }

    /// Convert to single-line JSON
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
