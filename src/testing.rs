//! Testing utilities for code built on whole-file input.
//!
//! This module provides:
//!
//! - **Mock I/O**: temporary directories populated with fixture files
//! - **Fixtures**: deterministic byte payloads and small file sets
//! - **Reader helpers**: drain a reader and compare its records with expectations
//!
//! For storage faults without touching disk, use [`MemoryStorage`](crate::MemoryStorage).
//!
//! # Quick Start
//!
//! ```no_run
//! use ironbeam_wholefile::*;
//! use ironbeam_wholefile::testing::*;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = TempDirPath::new()?;
//! write_files(dir.path(), &sample_files())?;
//!
//! let format = WholeFileInputFormat::default();
//! let splits = format.splits(&LocalStorage, &dir.pattern("*.bin"))?;
//! let mut reader = format.create_reader(&splits[0], Arc::new(LocalStorage))?;
//! let records = drain_reader(reader.as_mut())?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod mock_io;

pub use fixtures::*;
pub use mock_io::*;

use crate::error::Result;
use crate::reader::{Record, RecordReader};

/// Pull every record out of `reader`, then close it.
///
/// # Errors
/// Returns the first error raised by `next` or `close`.
pub fn drain_reader(reader: &mut dyn RecordReader) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    while let Some(record) = reader.next()? {
        records.push(record);
    }
    reader.close()?;
    Ok(records)
}

/// Assert that `records` hold exactly the `(key, value)` pairs in `expected`, in order.
///
/// # Panics
///
/// Panics if the assertion fails.
pub fn assert_records_eq(records: &[Record], expected: &[(&str, &[u8])]) {
    assert_eq!(
        records.len(),
        expected.len(),
        "record count mismatch:\n  Expected: {} records\n  Actual: {} records",
        expected.len(),
        records.len()
    );
    for (i, (actual, (key, value))) in records.iter().zip(expected).enumerate() {
        assert_eq!(actual.key, *key, "key mismatch at index {i}");
        assert_eq!(
            actual.value.as_slice(),
            *value,
            "value mismatch at index {i} ({key})"
        );
    }
}
