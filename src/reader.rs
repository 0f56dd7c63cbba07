//! Record readers: turning a split into key/value records.
//!
//! The host drives a reader with a simple loop:
//!
//! ```text
//! let mut reader = format.create_reader(&split, storage)?;
//! while let Some(record) = reader.next()? {
//!     process(record);
//! }
//! reader.close()?;
//! ```
//!
//! [`WholeFileRecordReader`] yields exactly one [`Record`] per split: the file's
//! qualified path and its complete bytes. Contents are never interpreted.

use crate::config::InputConfig;
use crate::error::{InputError, Result};
use crate::split::FileSplit;
use crate::storage::{ScopedStream, Storage};
use log::{debug, trace};
use std::sync::Arc;

/// One key/value pair handed to downstream processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Canonical path of the source file.
    pub key: String,
    /// Full file content.
    pub value: Vec<u8>,
}

/// Converts one split into a sequence of records.
///
/// Each instance is owned by a single task, so methods take `&mut self` and no
/// locking is involved. Readers for different splits run concurrently on
/// different workers without sharing mutable state.
pub trait RecordReader: Send {
    /// Produce the next record, or `None` once the split is exhausted.
    ///
    /// Calling `next` again after `None` keeps returning `None`.
    ///
    /// # Errors
    /// Returns an error if storage access fails. The reader does not retry.
    fn next(&mut self) -> Result<Option<Record>>;

    /// Fraction of the split consumed, in `[0.0, 1.0]`.
    fn progress(&self) -> f32;

    /// Current byte offset reported to the host.
    fn position(&self) -> u64;

    /// Release storage resources. Safe to call more than once.
    ///
    /// # Errors
    /// Returns an error if a resource fails to release. Records already returned stay valid.
    fn close(&mut self) -> Result<()>;
}

/// Lifecycle of a [`WholeFileRecordReader`]. Moves `Pending -> Done` once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// The record has not been produced yet.
    Pending,
    /// The record was produced; the split is exhausted.
    Done,
}

/// Reads an entire file as a single record.
pub struct WholeFileRecordReader {
    split: FileSplit,
    /// Length validated against the buffer limit at construction.
    length: usize,
    state: ReadState,
    storage: Option<Arc<dyn Storage>>,
}

impl std::fmt::Debug for WholeFileRecordReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WholeFileRecordReader")
            .field("split", &self.split)
            .field("state", &self.state)
            .field("closed", &self.storage.is_none())
            .finish()
    }
}

impl WholeFileRecordReader {
    /// Create a reader for `split`. Nothing is read until the first [`next`](RecordReader::next).
    ///
    /// # Errors
    /// Returns [`InputError::FileTooLarge`] if the split is longer than
    /// `config.max_record_size` or than this platform can hold in one buffer.
    pub fn new(split: &FileSplit, storage: Arc<dyn Storage>, config: &InputConfig) -> Result<Self> {
        let too_large = || InputError::FileTooLarge {
            path: split.path.clone(),
            length: split.length,
            limit: config.max_record_size,
        };
        if split.length > config.max_record_size {
            return Err(too_large());
        }
        let length = usize::try_from(split.length).map_err(|_| too_large())?;

        Ok(Self {
            split: split.clone(),
            length,
            state: ReadState::Pending,
            storage: Some(storage),
        })
    }

    #[must_use]
    pub fn state(&self) -> ReadState {
        self.state
    }

    #[must_use]
    pub fn split(&self) -> &FileSplit {
        &self.split
    }

    fn read_record(&self, storage: &dyn Storage) -> Result<Record> {
        let path = &self.split.path;
        let key = storage.qualify(path)?;

        let mut stream = ScopedStream::new(path.as_str(), storage.open(path, self.split.start)?);
        let mut value = vec![0u8; self.length];
        let read = stream
            .read_fully(&mut value)
            .map_err(|e| InputError::io(path.as_str(), e))?;
        if read < self.length {
            return Err(InputError::ShortRead {
                path: path.clone(),
                expected: self.split.length,
                actual: read as u64,
            });
        }
        stream.close().map_err(|e| InputError::io(path.as_str(), e))?;

        debug!("read {} bytes from {key}", value.len());
        Ok(Record { key, value })
    }
}

impl RecordReader for WholeFileRecordReader {
    fn next(&mut self) -> Result<Option<Record>> {
        if self.state == ReadState::Done {
            return Ok(None);
        }
        let storage = self.storage.as_deref().ok_or(InputError::Closed)?;
        let record = self.read_record(storage)?;
        self.state = ReadState::Done;
        trace!("{} -> {:?}", self.split, self.state);
        Ok(Some(record))
    }

    fn progress(&self) -> f32 {
        match self.state {
            ReadState::Pending => 0.0,
            ReadState::Done => 1.0,
        }
    }

    fn position(&self) -> u64 {
        0
    }

    fn close(&mut self) -> Result<()> {
        if self.storage.take().is_some() {
            trace!("closed reader for {}", self.split);
        }
        Ok(())
    }
}
