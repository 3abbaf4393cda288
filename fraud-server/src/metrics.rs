//! Prometheus metrics for the inference API
//!
//! Counters and the latency histogram are kept in process and rendered
//! in the text exposition format on `GET /metrics`.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Upper bounds (seconds) of the latency histogram buckets
pub const LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Default)]
struct Histogram {
    /// Non-cumulative counts per bucket, plus one for +Inf
    buckets: [u64; LATENCY_BUCKETS.len() + 1],
    sum: f64,
    count: u64,
}

impl Histogram {
    fn observe(&mut self, value: f64) {
        let idx = LATENCY_BUCKETS
            .iter()
            .position(|&le| value <= le)
            .unwrap_or(LATENCY_BUCKETS.len());
        self.buckets[idx] += 1;
        self.sum += value;
        self.count += 1;
    }
}

/// Metrics collector shared by all handlers
#[derive(Debug, Default)]
pub struct ApiMetrics {
    /// (model_version, prediction) -> count
    predictions: Mutex<BTreeMap<(String, String), u64>>,
    /// error_type -> count
    errors: Mutex<BTreeMap<String, u64>>,
    latency: Mutex<Histogram>,
    model_loaded: AtomicBool,
    requests: AtomicU64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one scored transaction
    pub fn record_prediction(&self, model_version: &str, prediction: &str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        *self
            .predictions
            .lock()
            .entry((model_version.to_string(), prediction.to_string()))
            .or_insert(0) += 1;
    }

    pub fn record_error(&self, error_type: &str) {
        *self.errors.lock().entry(error_type.to_string()).or_insert(0) += 1;
    }

    pub fn observe_latency(&self, elapsed: Duration) {
        self.latency.lock().observe(elapsed.as_secs_f64());
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.model_loaded.store(loaded, Ordering::Relaxed);
    }

    /// Transactions scored since startup
    pub fn predictions_total(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Render every metric in the text exposition format
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP predictions_total Total number of predictions made\n");
        out.push_str("# TYPE predictions_total counter\n");
        for ((version, prediction), count) in self.predictions.lock().iter() {
            let _ = writeln!(
                out,
                "predictions_total{{model_version=\"{}\",prediction=\"{}\"}} {}",
                version, prediction, count
            );
        }

        out.push_str("# HELP prediction_errors_total Total number of prediction errors\n");
        out.push_str("# TYPE prediction_errors_total counter\n");
        for (error_type, count) in self.errors.lock().iter() {
            let _ = writeln!(
                out,
                "prediction_errors_total{{error_type=\"{}\"}} {}",
                error_type, count
            );
        }

        out.push_str("# HELP prediction_latency_seconds Prediction latency in seconds\n");
        out.push_str("# TYPE prediction_latency_seconds histogram\n");
        {
            let hist = self.latency.lock();
            let mut cumulative = 0;
            for (le, count) in LATENCY_BUCKETS.iter().zip(hist.buckets.iter()) {
                cumulative += count;
                let _ = writeln!(
                    out,
                    "prediction_latency_seconds_bucket{{le=\"{}\"}} {}",
                    le, cumulative
                );
            }
            let _ = writeln!(
                out,
                "prediction_latency_seconds_bucket{{le=\"+Inf\"}} {}",
                hist.count
            );
            let _ = writeln!(out, "prediction_latency_seconds_sum {}", hist.sum);
            let _ = writeln!(out, "prediction_latency_seconds_count {}", hist.count);
        }

        out.push_str("# HELP model_loaded Whether a model is loaded (1) or not (0)\n");
        out.push_str("# TYPE model_loaded gauge\n");
        let _ = writeln!(
            out,
            "model_loaded {}",
            u8::from(self.model_loaded.load(Ordering::Relaxed))
        );

        out
    }
}
