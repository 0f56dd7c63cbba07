//! Counters collected while reading input.
//!
//! The [`LocalRunner`](crate::runner::LocalRunner) records how much it planned and
//! read into a [`MetricsCollector`]. Users can register their own metrics next to
//! the built-in ones and print or save everything after the job.
//!
//! # Example
//!
//! ```no_run
//! use ironbeam_wholefile::metrics::{MetricsCollector, GaugeMetric};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut metrics = MetricsCollector::new();
//! metrics.register(Box::new(GaugeMetric::new("input_ratio", 0.5)));
//! metrics.increment_counter("records_read", 3);
//! metrics.print();
//! metrics.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Splits produced by planning.
pub const SPLITS_PLANNED: &str = "splits_planned";
/// Records handed to the user function.
pub const RECORDS_READ: &str = "records_read";
/// Bytes of record values read.
pub const BYTES_READ: &str = "bytes_read";
/// Task attempts that failed, retried or not.
pub const TASK_ATTEMPTS_FAILED: &str = "task_attempts_failed";
/// Reader close failures after successful delivery.
pub const CLOSE_ERRORS: &str = "close_errors";

/// Counters owned by the runner, reset at the start of every job.
pub const RUNNER_COUNTERS: [&str; 5] = [
    SPLITS_PLANNED,
    RECORDS_READ,
    BYTES_READ,
    TASK_ATTEMPTS_FAILED,
    CLOSE_ERRORS,
];

/// Trait for custom metrics.
pub trait Metric: Send + Sync + Any {
    /// The name of this metric (e.g., `records_read`).
    fn name(&self) -> &str;

    /// The current value of this metric as a JSON value.
    fn value(&self) -> Value;

    /// Optional description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Cast to Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Thread-safe container for job metrics. Clones share the same state.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

#[derive(Default)]
struct MetricsCollectorInner {
    metrics: HashMap<String, Box<dyn Metric>>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("metrics", &self.snapshot())
            .finish()
    }
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsCollectorInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a metric, replacing any metric with the same name.
    pub fn register(&mut self, metric: Box<dyn Metric>) {
        self.lock().metrics.insert(metric.name().to_string(), metric);
    }

    pub fn record_start(&self) {
        self.lock().start_time = Some(Instant::now());
    }

    pub fn record_end(&self) {
        self.lock().end_time = Some(Instant::now());
    }

    /// Elapsed time between [`record_start`](Self::record_start) and
    /// [`record_end`](Self::record_end), if both were called.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start_time, inner.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Add `value` to a counter, creating it at zero if missing.
    ///
    /// A non-counter metric registered under `name` is replaced by a counter.
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut inner = self.lock();
        let current = inner
            .metrics
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<CounterMetric>())
            .map_or(0, |c| c.count);
        inner.metrics.insert(
            name.to_string(),
            Box::new(CounterMetric::with_value(name, current + value)),
        );
    }

    pub fn set_counter(&self, name: &str, value: u64) {
        self.lock()
            .metrics
            .insert(name.to_string(), Box::new(CounterMetric::with_value(name, value)));
    }

    /// Drop the metric registered under `name`. Returns `true` if one existed.
    pub fn remove(&self, name: &str) -> bool {
        self.lock().metrics.remove(name).is_some()
    }

    /// Current value of a counter, if one is registered under `name`.
    #[must_use]
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.lock()
            .metrics
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<CounterMetric>())
            .map(|c| c.count)
    }

    /// All metrics as a JSON object, plus `execution_time_ms` when timing was recorded.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut out: serde_json::Map<String, Value> = inner
            .metrics
            .iter()
            .map(|(name, metric)| {
                let entry = match metric.description() {
                    Some(desc) => json!({ "value": metric.value(), "description": desc }),
                    None => json!({ "value": metric.value() }),
                };
                (name.clone(), entry)
            })
            .collect();

        if let (Some(start), Some(end)) = (inner.start_time, inner.end_time) {
            out.insert(
                "execution_time_ms".to_string(),
                json!({
                    "value": end.duration_since(start).as_millis(),
                    "description": "Total job execution time in milliseconds",
                }),
            );
        }
        Value::Object(out)
    }

    /// Print all metrics to stdout, sorted by name.
    pub fn print(&self) {
        println!("\n=========== Input Metrics ============");
        if let Some(elapsed) = self.elapsed() {
            println!(
                "Execution Time: {:.3}s ({} ms)",
                elapsed.as_secs_f64(),
                elapsed.as_millis()
            );
            println!("--------------------------------------");
        }
        let inner = self.lock();
        let mut sorted: Vec<_> = inner.metrics.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);
        for (name, metric) in sorted {
            match metric.description() {
                Some(desc) => println!("{}: {} ({})", name, metric.value(), desc),
                None => println!("{}: {}", name, metric.value()),
            }
        }
        drop(inner);
        println!("======================================\n");
    }

    /// Save all metrics to a pretty-printed JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Metric names mapped to their current values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock()
            .metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.value()))
            .collect()
    }
}

/// A monotonically increasing count.
#[derive(Debug, Clone)]
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A single numeric value.
#[derive(Debug, Clone)]
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
