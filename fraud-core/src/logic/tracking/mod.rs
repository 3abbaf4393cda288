//! Tracking Module - Experiment tracking
//!
//! Runs, parameters, metrics and artifact paths are reported through the
//! `ExperimentTracker` trait. Tracking never influences training: callers
//! log tracker failures and carry on.
//!
//! ## Structure
//! - `event.rs` - TrackingEvent records and run ids
//! - `recorder.rs` - Append-only JSONL tracker
//!
//! ## Usage
//! ```ignore
//! let tracker = JsonlTracker::open(dir, "fraud-detection")?;
//! let run = tracker.start_run("baseline")?;
//! tracker.log_metric(&run, "f1_score", 0.84)?;
//! tracker.end_run(&run, RunStatus::Finished)?;
//! ```

pub mod event;
pub mod recorder;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;

use crate::logic::error::CoreResult;

pub use event::{RunId, RunStatus, TrackingEvent};
pub use recorder::{read_events, JsonlTracker};

// ============================================================================
// TRACKER TRAIT
// ============================================================================

pub trait ExperimentTracker: Send + Sync {
    /// Experiment every run of this tracker belongs to
    fn experiment(&self) -> &str;

    /// Persist one event
    fn record(&self, event: TrackingEvent) -> CoreResult<()>;

    fn start_run(&self, run_name: &str) -> CoreResult<RunId> {
        let run_id = RunId::new();
        self.record(TrackingEvent::RunStarted {
            run_id: run_id.clone(),
            experiment: self.experiment().to_string(),
            run_name: run_name.to_string(),
            timestamp: Utc::now(),
        })?;
        Ok(run_id)
    }

    fn log_param(&self, run_id: &RunId, key: &str, value: Value) -> CoreResult<()> {
        self.record(TrackingEvent::Param {
            run_id: run_id.clone(),
            key: key.to_string(),
            value,
        })
    }

    fn log_params(&self, run_id: &RunId, params: &BTreeMap<String, Value>) -> CoreResult<()> {
        for (key, value) in params {
            self.log_param(run_id, key, value.clone())?;
        }
        Ok(())
    }

    fn log_metric(&self, run_id: &RunId, key: &str, value: f64) -> CoreResult<()> {
        self.record(TrackingEvent::Metric {
            run_id: run_id.clone(),
            key: key.to_string(),
            value,
            timestamp: Utc::now(),
        })
    }

    fn log_metrics(&self, run_id: &RunId, metrics: &BTreeMap<String, f64>) -> CoreResult<()> {
        for (key, value) in metrics {
            self.log_metric(run_id, key, *value)?;
        }
        Ok(())
    }

    fn log_artifact(&self, run_id: &RunId, path: &Path) -> CoreResult<()> {
        self.record(TrackingEvent::Artifact {
            run_id: run_id.clone(),
            path: path.display().to_string(),
        })
    }

    fn end_run(&self, run_id: &RunId, status: RunStatus) -> CoreResult<()> {
        self.record(TrackingEvent::RunEnded {
            run_id: run_id.clone(),
            status,
            timestamp: Utc::now(),
        })
    }
}

// ============================================================================
// IN-PROCESS TRACKERS
// ============================================================================

/// Discards every event
#[derive(Debug, Default)]
pub struct NoopTracker;

impl ExperimentTracker for NoopTracker {
    fn experiment(&self) -> &str {
        "noop"
    }

    fn record(&self, _event: TrackingEvent) -> CoreResult<()> {
        Ok(())
    }
}

/// Keeps events in memory (tests, dry runs)
#[derive(Debug)]
pub struct MemoryTracker {
    experiment: String,
    events: Mutex<Vec<TrackingEvent>>,
}

impl MemoryTracker {
    pub fn new(experiment: &str) -> Self {
        Self {
            experiment: experiment.to_string(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        self.events.lock().clone()
    }

    /// Ids of started runs, in start order
    pub fn runs(&self) -> Vec<RunId> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackingEvent::RunStarted { run_id, .. } => Some(run_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last value logged for each metric of a run
    pub fn metrics(&self, run_id: &RunId) -> BTreeMap<String, f64> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackingEvent::Metric { run_id: r, key, value, .. } if r == run_id => {
                    Some((key.clone(), *value))
                }
                _ => None,
            })
            .collect()
    }

    pub fn params(&self, run_id: &RunId) -> BTreeMap<String, Value> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TrackingEvent::Param { run_id: r, key, value } if r == run_id => {
                    Some((key.clone(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn status(&self, run_id: &RunId) -> Option<RunStatus> {
        self.events.lock().iter().find_map(|e| match e {
            TrackingEvent::RunEnded { run_id: r, status, .. } if r == run_id => Some(*status),
            _ => None,
        })
    }
}

impl ExperimentTracker for MemoryTracker {
    fn experiment(&self) -> &str {
        &self.experiment
    }

    fn record(&self, event: TrackingEvent) -> CoreResult<()> {
        self.events.lock().push(event);
        Ok(())
    }
}
