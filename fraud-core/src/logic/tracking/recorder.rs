//! JSONL Tracker
//!
//! Append-only JSONL writer for tracking events, one file per experiment.
//! Thread-safe; every event is flushed as soon as it is written.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::event::TrackingEvent;
use super::ExperimentTracker;
use crate::logic::error::CoreResult;

/// Tracking file extension
const LOG_EXT: &str = "jsonl";

pub struct JsonlTracker {
    experiment: String,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    events_recorded: AtomicU64,
}

impl JsonlTracker {
    /// Open (or create) `<dir>/<experiment>.jsonl` for appending
    pub fn open(dir: &Path, experiment: &str) -> CoreResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", experiment, LOG_EXT));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::info!("Tracking experiment '{}' in {}", experiment, path.display());

        Ok(Self {
            experiment: experiment.to_string(),
            path,
            writer: Mutex::new(BufWriter::new(file)),
            events_recorded: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events_recorded(&self) -> u64 {
        self.events_recorded.load(Ordering::SeqCst)
    }
}

impl ExperimentTracker for JsonlTracker {
    fn experiment(&self) -> &str {
        &self.experiment
    }

    fn record(&self, event: TrackingEvent) -> CoreResult<()> {
        let line = event.to_jsonl()?;

        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        self.events_recorded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Read all events from a tracking file, skipping lines that do not parse
pub fn read_events(path: &Path) -> CoreResult<Vec<TrackingEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TrackingEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => log::warn!("Skipping unreadable tracking line: {}", e),
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::tracking::RunStatus;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_tracker_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = JsonlTracker::open(&temp_dir.path().join("runs"), "fraud").unwrap();
        assert!(tracker.path().exists());
        assert!(tracker.path().ends_with("fraud.jsonl"));
    }

    #[test]
    fn test_jsonl_format() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = JsonlTracker::open(temp_dir.path(), "fraud").unwrap();

        let run = tracker.start_run("baseline").unwrap();
        tracker.log_param(&run, "max_depth", json!(10)).unwrap();
        tracker.log_metric(&run, "f1_score", 0.82).unwrap();
        tracker.end_run(&run, RunStatus::Finished).unwrap();

        let content = std::fs::read_to_string(tracker.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(tracker.events_recorded(), 4);
        assert!(lines[0].contains("\"event\":\"run_started\""));

        let events = read_events(tracker.path()).unwrap();
        assert!(events.iter().all(|e| e.run_id() == &run));
        assert!(matches!(
            events[2],
            TrackingEvent::Metric { value, .. } if value == 0.82
        ));
    }

    #[test]
    fn test_reopen_appends() {
        let temp_dir = TempDir::new().unwrap();
        {
            let tracker = JsonlTracker::open(temp_dir.path(), "fraud").unwrap();
            tracker.start_run("first").unwrap();
        }
        let tracker = JsonlTracker::open(temp_dir.path(), "fraud").unwrap();
        tracker.start_run("second").unwrap();

        assert_eq!(read_events(tracker.path()).unwrap().len(), 2);
    }
}
