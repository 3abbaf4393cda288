//! Pipeline Context
//!
//! Threads one tracked run through the pipeline stages. Each stage is timed
//! and summarized; parameters and metrics are forwarded to the tracker.
//! Tracker failures are logged and swallowed.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::logic::error::CoreResult;
use crate::logic::tracking::{ExperimentTracker, RunId, RunStatus};

/// Outcome of one pipeline stage
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageRecord {
    pub name: String,
    pub duration_ms: f64,
    pub succeeded: bool,
    pub summary: String,
}

pub struct PipelineContext<'a> {
    tracker: &'a dyn ExperimentTracker,
    run_id: Option<RunId>,
    run_name: String,
    stages: Vec<StageRecord>,
}

impl<'a> PipelineContext<'a> {
    /// Open a tracked run named `run_name`
    pub fn start(tracker: &'a dyn ExperimentTracker, run_name: &str) -> Self {
        let run_id = match tracker.start_run(run_name) {
            Ok(id) => {
                log::info!("Run '{}' started (id {})", run_name, id);
                Some(id)
            }
            Err(e) => {
                log::warn!("Tracker could not start run '{}': {}", run_name, e);
                None
            }
        };

        Self {
            tracker,
            run_id,
            run_name: run_name.to_string(),
            stages: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    /// Run `f` as stage `name`; `summarize` describes a successful result
    pub fn stage<T>(
        &mut self,
        name: &str,
        summarize: impl FnOnce(&T) -> String,
        f: impl FnOnce() -> CoreResult<T>,
    ) -> CoreResult<T> {
        log::info!("[{}] {}", self.run_name, name);
        let started = Instant::now();
        let result = f();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let (succeeded, summary) = match &result {
            Ok(value) => (true, summarize(value)),
            Err(e) => (false, e.to_string()),
        };
        if succeeded {
            log::info!("[{}] {} done in {:.1} ms: {}", self.run_name, name, duration_ms, summary);
        } else {
            log::error!("[{}] {} failed after {:.1} ms: {}", self.run_name, name, duration_ms, summary);
        }

        self.log_metric(&format!("stage.{}.duration_ms", name), duration_ms);
        self.stages.push(StageRecord {
            name: name.to_string(),
            duration_ms,
            succeeded,
            summary,
        });
        result
    }

    fn observe(&self, what: &str, outcome: CoreResult<()>) {
        if let Err(e) = outcome {
            log::warn!("Tracker failed to record {}: {}", what, e);
        }
    }

    pub fn log_param(&self, key: &str, value: Value) {
        if let Some(run) = &self.run_id {
            self.observe(key, self.tracker.log_param(run, key, value));
        }
    }

    pub fn log_params(&self, params: &BTreeMap<String, Value>) {
        if let Some(run) = &self.run_id {
            self.observe("params", self.tracker.log_params(run, params));
        }
    }

    pub fn log_metric(&self, key: &str, value: f64) {
        if let Some(run) = &self.run_id {
            self.observe(key, self.tracker.log_metric(run, key, value));
        }
    }

    pub fn log_metrics(&self, metrics: &BTreeMap<String, f64>) {
        if let Some(run) = &self.run_id {
            self.observe("metrics", self.tracker.log_metrics(run, metrics));
        }
    }

    pub fn log_artifact(&self, path: &Path) {
        if let Some(run) = &self.run_id {
            self.observe("artifact", self.tracker.log_artifact(run, path));
        }
    }

    /// Close the run; finished only if every stage succeeded
    pub fn finish(self) -> (Option<RunId>, Vec<StageRecord>) {
        let status = if self.stages.iter().all(|s| s.succeeded) {
            RunStatus::Finished
        } else {
            RunStatus::Failed
        };
        if let Some(run) = &self.run_id {
            self.observe("run end", self.tracker.end_run(run, status));
        }
        (self.run_id, self.stages)
    }
}
