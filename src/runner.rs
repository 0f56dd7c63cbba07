//! A minimal in-process host for input formats.
//!
//! [`LocalRunner`] plays the part of the batch framework around the input layer:
//! it plans splits once, runs one task per split (sequentially or on a rayon pool),
//! and feeds each record to a caller-supplied function.
//!
//! Retry lives here, never in readers. A task attempt that fails with a retryable
//! error is thrown away and rerun from scratch with a fresh reader, up to
//! `max_task_attempts` attempts. Configuration errors such as
//! [`InputError::FileTooLarge`] fail the job immediately.
//!
//! ```no_run
//! use ironbeam_wholefile::*;
//! use std::sync::Arc;
//!
//! # fn main() -> ironbeam_wholefile::Result<()> {
//! let runner = LocalRunner::default();
//! let format = WholeFileInputFormat::default();
//! let report = runner.run(&format, Arc::new(LocalStorage), "images/*.png", |rec| {
//!     Ok((rec.key, rec.value.len()))
//! })?;
//! println!("read {} files, {} bytes", report.records, report.bytes);
//! # Ok(())
//! # }
//! ```

use crate::config::InputConfig;
use crate::error::{InputError, Result};
use crate::format::InputFormat;
use crate::metrics::{
    BYTES_READ, CLOSE_ERRORS, MetricsCollector, RECORDS_READ, RUNNER_COUNTERS, SPLITS_PLANNED,
    TASK_ATTEMPTS_FAILED,
};
use crate::reader::{Record, RecordReader};
use crate::storage::Storage;
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    /// One task per split on a rayon pool; `threads: None` sizes it from the CPU count.
    Parallel { threads: Option<usize> },
}

#[derive(Debug)]
pub struct LocalRunner {
    pub mode: ExecMode,
    pub config: InputConfig,
    pub metrics: MetricsCollector,
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

/// Outcome of a successful job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport<O> {
    /// Results of the record function, in split order then record order.
    pub outputs: Vec<O>,
    pub splits: usize,
    pub records: u64,
    pub bytes: u64,
}

struct TaskOutput<O> {
    outputs: Vec<O>,
    records: u64,
    bytes: u64,
}

impl LocalRunner {
    /// A parallel runner using `config.parallelism` threads.
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        Self {
            mode: ExecMode::Parallel {
                threads: config.parallelism,
            },
            config,
            metrics: MetricsCollector::new(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Plan `pattern` with `format` and run every split through `f`.
    ///
    /// The runner's own counters in [`metrics`](Self::metrics) describe only the
    /// latest job; metrics registered by the caller are left alone.
    ///
    /// # Errors
    /// Returns [`InputError::Config`] for an invalid config, planning errors as-is, and
    /// [`InputError::TaskFailed`] for the first task that fails permanently.
    pub fn run<F, O, Fun>(
        &self,
        format: &F,
        storage: Arc<dyn Storage>,
        pattern: &str,
        f: Fun,
    ) -> Result<JobReport<O>>
    where
        F: InputFormat,
        O: Send,
        Fun: Fn(Record) -> anyhow::Result<O> + Send + Sync,
    {
        self.config.validate()?;
        for name in RUNNER_COUNTERS {
            self.metrics.remove(name);
        }
        self.metrics.record_start();

        let splits = format.splits(storage.as_ref(), pattern)?;
        self.metrics
            .increment_counter(SPLITS_PLANNED, splits.len() as u64);
        debug!("running {} tasks for {pattern}", splits.len());

        let tasks = match self.mode {
            ExecMode::Sequential => splits
                .iter()
                .map(|split| self.run_task(format, split, &storage, &f))
                .collect::<Result<Vec<_>>>()?,
            ExecMode::Parallel { threads } => {
                self.run_parallel(format, &splits, &storage, &f, threads)?
            }
        };

        let mut report = JobReport {
            outputs: Vec::new(),
            splits: splits.len(),
            records: 0,
            bytes: 0,
        };
        for task in tasks {
            report.records += task.records;
            report.bytes += task.bytes;
            report.outputs.extend(task.outputs);
        }
        self.metrics.increment_counter(RECORDS_READ, report.records);
        self.metrics.increment_counter(BYTES_READ, report.bytes);
        self.metrics.record_end();

        info!(
            "read {} records ({} bytes) from {} splits",
            report.records, report.bytes, report.splits
        );
        Ok(report)
    }

    #[cfg(feature = "parallel-io")]
    fn run_parallel<F, O, Fun>(
        &self,
        format: &F,
        splits: &[F::Split],
        storage: &Arc<dyn Storage>,
        f: &Fun,
        threads: Option<usize>,
    ) -> Result<Vec<TaskOutput<O>>>
    where
        F: InputFormat,
        O: Send,
        Fun: Fn(Record) -> anyhow::Result<O> + Send + Sync,
    {
        use rayon::prelude::*;
        let threads = threads
            .unwrap_or_else(|| num_cpus::get().max(2))
            .clamp(1, splits.len().max(1));
        debug!("using {threads} worker threads");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(anyhow::Error::from)?;
        pool.install(|| {
            splits
                .par_iter()
                .map(|split| self.run_task(format, split, storage, f))
                .collect()
        })
    }

    #[cfg(not(feature = "parallel-io"))]
    fn run_parallel<F, O, Fun>(
        &self,
        format: &F,
        splits: &[F::Split],
        storage: &Arc<dyn Storage>,
        f: &Fun,
        _threads: Option<usize>,
    ) -> Result<Vec<TaskOutput<O>>>
    where
        F: InputFormat,
        O: Send,
        Fun: Fn(Record) -> anyhow::Result<O> + Send + Sync,
    {
        splits
            .iter()
            .map(|split| self.run_task(format, split, storage, f))
            .collect()
    }

    fn run_task<F, O, Fun>(
        &self,
        format: &F,
        split: &F::Split,
        storage: &Arc<dyn Storage>,
        f: &Fun,
    ) -> Result<TaskOutput<O>>
    where
        F: InputFormat,
        Fun: Fn(Record) -> anyhow::Result<O>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(format, split, storage, f) {
                Ok(output) => return Ok(output),
                Err(e) => {
                    self.metrics.increment_counter(TASK_ATTEMPTS_FAILED, 1);
                    if e.is_retryable() && attempts < self.config.max_task_attempts {
                        warn!("attempt {attempts} for {split} failed, retrying: {e}");
                        continue;
                    }
                    return Err(InputError::TaskFailed {
                        split: split.to_string(),
                        attempts,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    /// One attempt: fresh reader, drain, close. Nothing survives a failed attempt.
    fn attempt<F, O, Fun>(
        &self,
        format: &F,
        split: &F::Split,
        storage: &Arc<dyn Storage>,
        f: &Fun,
    ) -> Result<TaskOutput<O>>
    where
        F: InputFormat,
        Fun: Fn(Record) -> anyhow::Result<O>,
    {
        let mut reader = format.create_reader(split, Arc::clone(storage))?;
        let mut output = TaskOutput {
            outputs: Vec::new(),
            records: 0,
            bytes: 0,
        };
        let drained = drain(reader.as_mut(), f, &mut output);
        let closed = reader.close();

        match (drained, closed) {
            (Err(e), Err(close_err)) => {
                warn!("close after failed read of {split} also failed: {close_err}");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), Err(close_err)) => {
                // Records already delivered stay valid.
                warn!("failed to close reader for {split}: {close_err}");
                self.metrics.increment_counter(CLOSE_ERRORS, 1);
                Ok(output)
            }
            (Ok(()), Ok(())) => Ok(output),
        }
    }
}

fn drain<O, Fun>(reader: &mut dyn RecordReader, f: &Fun, output: &mut TaskOutput<O>) -> Result<()>
where
    Fun: Fn(Record) -> anyhow::Result<O>,
{
    while let Some(record) = reader.next()? {
        output.records += 1;
        output.bytes += record.value.len() as u64;
        output.outputs.push(f(record)?);
    }
    Ok(())
}
