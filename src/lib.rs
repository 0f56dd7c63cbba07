//! # Ironbeam whole-file input
//!
//! An input format for Ironbeam-style batch jobs that treats every file as one
//! indivisible unit of work. Planning produces **one split per file**, whatever its
//! size, and reading a split produces **one record**: the file's canonical path as
//! the key and its complete bytes as the value.
//!
//! Use it when downstream logic needs entire files (images, PDFs, archives, any
//! binary format that cannot be decoded from an arbitrary byte range). Contents are
//! never interpreted.
//!
//! ## Key Features
//!
//! - **Whole-file splits** - [`WholeFilePolicy`] overrides size-based splitting
//! - **One record per file** - [`WholeFileRecordReader`] with an explicit `Pending -> Done` state
//! - **Batching** - [`CombineWholeFileInputFormat`] packs many small files into one task
//! - **Explicit storage** - readers receive an `Arc<dyn Storage>`; no global filesystem handle
//! - **Local runner** - [`LocalRunner`] plans, reads in parallel with Rayon, and retries failed tasks
//! - **Metrics** - split, record, byte and failure counters
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironbeam_wholefile::*;
//! use std::sync::Arc;
//!
//! # fn main() -> ironbeam_wholefile::Result<()> {
//! let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new());
//! let format = WholeFileInputFormat::new(InputConfig::default());
//!
//! // Planning: one split per matching file.
//! let splits = format.splits(storage.as_ref(), "scans/*.pdf")?;
//!
//! // Execution: one reader per split, one record per reader.
//! for split in &splits {
//!     let mut reader = format.create_reader(split, Arc::clone(&storage))?;
//!     while let Some(record) = reader.next()? {
//!         println!("{} -> {} bytes", record.key, record.value.len());
//!     }
//!     reader.close()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Splits
//!
//! A [`FileSplit`] names a byte range of one file. Whole-file planning always
//! covers the full file from offset zero. A [`CombinedSplit`] is an ordered batch
//! of such splits for one task.
//!
//! ### Record readers
//!
//! A [`RecordReader`] turns one split into records. [`WholeFileRecordReader`]:
//! - fails construction with [`InputError::FileTooLarge`] when the split exceeds
//!   [`InputConfig::max_record_size`]
//! - reads the file on the first `next()` and returns `None` forever after
//! - reports progress `0.0` before the record and `1.0` after, and position `0`
//! - never retries; the host reruns the task with a fresh reader
//!
//! ### Storage
//!
//! [`Storage`] lists, qualifies and opens files. [`LocalStorage`] uses the local
//! filesystem; [`MemoryStorage`] is an in-memory fake with fault injection.
//!
//! ## Errors
//!
//! Every fallible operation returns [`Result<T>`] with an [`InputError`]. Use
//! [`InputError::is_retryable`] to separate transient I/O failures from
//! configuration errors.
//!
//! ## Logging
//!
//! The crate logs through the `log` facade and never installs a logger.

pub mod combine;
pub mod config;
pub mod error;
pub mod format;
pub mod metrics;
pub mod policy;
pub mod reader;
pub mod runner;
pub mod split;
pub mod storage;
pub mod testing;

pub use combine::{CombinedRecordReader, combine_splits};
pub use config::{DEFAULT_MAX_RECORD_SIZE, InputConfig};
pub use error::{ErrorKind, InputError, Result};
pub use format::{CombineWholeFileInputFormat, InputFormat, WholeFileInputFormat};
pub use metrics::MetricsCollector;
pub use policy::{BlockSplitPolicy, SplitPolicy, WholeFilePolicy, plan_splits};
pub use reader::{ReadState, Record, RecordReader, WholeFileRecordReader};
pub use runner::{ExecMode, JobReport, LocalRunner};
pub use split::{CombinedSplit, FileSplit, InputFile};
pub use storage::{Fault, InputStream, LocalStorage, MemoryStorage, Storage};
