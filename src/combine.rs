//! Batching many whole files into one task.
//!
//! One task per small file wastes scheduling overhead. [`combine_splits`] packs
//! whole-file splits into [`CombinedSplit`]s, and [`CombinedRecordReader`] drives
//! one [`WholeFileRecordReader`] per member in order. The single-file reader keeps
//! its own contract; the composite only forwards calls.

use crate::config::InputConfig;
use crate::error::Result;
use crate::reader::{Record, RecordReader, WholeFileRecordReader};
use crate::split::{CombinedSplit, FileSplit};
use crate::storage::Storage;
use log::{debug, warn};
use std::sync::Arc;

/// Greedily pack splits into batches, preserving order.
///
/// A batch is closed when adding the next split would exceed `max_files` members or
/// `max_bytes` total length. A split longer than `max_bytes` gets a batch of its own.
/// No batch is ever empty.
pub fn combine_splits(splits: Vec<FileSplit>, max_files: usize, max_bytes: u64) -> Vec<CombinedSplit> {
    let max_files = max_files.max(1);
    let mut batches = Vec::new();
    let mut current: Vec<FileSplit> = Vec::new();
    let mut current_bytes = 0u64;

    for split in splits {
        let over_files = current.len() >= max_files;
        let over_bytes = current_bytes.saturating_add(split.length) > max_bytes;
        if !current.is_empty() && (over_files || over_bytes) {
            batches.push(CombinedSplit::new(std::mem::take(&mut current)));
            current_bytes = 0;
        }
        current_bytes = current_bytes.saturating_add(split.length);
        current.push(split);
    }
    if !current.is_empty() {
        batches.push(CombinedSplit::new(current));
    }
    debug!("combined splits into {} batches", batches.len());
    batches
}

/// Reads every file of a [`CombinedSplit`], one record per file, in order.
pub struct CombinedRecordReader {
    readers: Vec<Box<dyn RecordReader>>,
    /// Index of the member currently being read; `readers.len()` once exhausted.
    current: usize,
}

impl std::fmt::Debug for CombinedRecordReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedRecordReader")
            .field("members", &self.readers.len())
            .field("current", &self.current)
            .finish()
    }
}

impl CombinedRecordReader {
    /// Build a reader for every member up front.
    ///
    /// # Errors
    /// Fails with [`crate::InputError::FileTooLarge`] if any member exceeds the record limit.
    pub fn new(split: &CombinedSplit, storage: Arc<dyn Storage>, config: &InputConfig) -> Result<Self> {
        let readers = split
            .splits
            .iter()
            .map(|s| {
                WholeFileRecordReader::new(s, Arc::clone(&storage), config)
                    .map(|r| Box::new(r) as Box<dyn RecordReader>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_readers(readers))
    }

    /// Chain already constructed readers, read in the given order.
    #[must_use]
    pub fn from_readers(readers: Vec<Box<dyn RecordReader>>) -> Self {
        Self {
            readers,
            current: 0,
        }
    }

    /// Number of member files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl RecordReader for CombinedRecordReader {
    fn next(&mut self) -> Result<Option<Record>> {
        while let Some(reader) = self.readers.get_mut(self.current) {
            if let Some(record) = reader.next()? {
                return Ok(Some(record));
            }
            reader.close()?;
            self.current += 1;
        }
        Ok(None)
    }

    #[allow(clippy::cast_precision_loss)]
    fn progress(&self) -> f32 {
        if self.readers.is_empty() {
            return 1.0;
        }
        let partial = self
            .readers
            .get(self.current)
            .map_or(0.0, |r| r.progress());
        (self.current as f32 + partial) / self.readers.len() as f32
    }

    fn position(&self) -> u64 {
        0
    }

    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        for (i, reader) in self.readers.iter_mut().enumerate() {
            if let Err(e) = reader.close() {
                warn!("failed to close member reader {i}: {e}");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
