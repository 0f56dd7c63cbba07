//! Input formats: the host-facing bundle of split policy, planning and reader creation.
//!
//! A host asks a format for its splits once during planning, then asks it for a
//! reader once per split during execution. Both whole-file formats share the same
//! policy; they differ only in how many files one task receives.

use crate::combine::{CombinedRecordReader, combine_splits};
use crate::config::InputConfig;
use crate::error::Result;
use crate::policy::{SplitPolicy, WholeFilePolicy, plan_splits};
use crate::reader::{RecordReader, WholeFileRecordReader};
use crate::split::{CombinedSplit, FileSplit, InputFile};
use crate::storage::Storage;
use std::fmt::{Debug, Display};
use std::sync::Arc;

pub trait InputFormat: Send + Sync {
    /// The unit of work assigned to one task.
    type Split: Clone + Debug + Display + Send + Sync;

    /// Whether `file` may be divided across several splits.
    fn is_splittable(&self, file: &InputFile) -> bool;

    /// Discover files matching `pattern` and plan them into splits.
    ///
    /// # Errors
    /// Returns an error if the pattern is invalid or listing fails.
    fn splits(&self, storage: &dyn Storage, pattern: &str) -> Result<Vec<Self::Split>>;

    /// Create a fresh reader for `split`.
    ///
    /// # Errors
    /// Returns an error if the split cannot be read under this format's configuration.
    fn create_reader(
        &self,
        split: &Self::Split,
        storage: Arc<dyn Storage>,
    ) -> Result<Box<dyn RecordReader>>;
}

/// One task per file; each task reads its file as a single record.
#[derive(Debug, Clone, Default)]
pub struct WholeFileInputFormat {
    pub config: InputConfig,
}

impl WholeFileInputFormat {
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }
}

impl InputFormat for WholeFileInputFormat {
    type Split = FileSplit;

    fn is_splittable(&self, file: &InputFile) -> bool {
        WholeFilePolicy.is_splittable(file)
    }

    fn splits(&self, storage: &dyn Storage, pattern: &str) -> Result<Vec<FileSplit>> {
        let files = storage.list(pattern)?;
        Ok(plan_splits(&WholeFilePolicy, &files, self.config.split_size))
    }

    fn create_reader(
        &self,
        split: &FileSplit,
        storage: Arc<dyn Storage>,
    ) -> Result<Box<dyn RecordReader>> {
        Ok(Box::new(WholeFileRecordReader::new(split, storage, &self.config)?))
    }
}

/// Like [`WholeFileInputFormat`], but packs several files into each task.
///
/// Batches are bounded by `config.max_files_per_split` and `config.max_split_bytes`.
#[derive(Debug, Clone, Default)]
pub struct CombineWholeFileInputFormat {
    pub config: InputConfig,
}

impl CombineWholeFileInputFormat {
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }
}

impl InputFormat for CombineWholeFileInputFormat {
    type Split = CombinedSplit;

    fn is_splittable(&self, file: &InputFile) -> bool {
        WholeFilePolicy.is_splittable(file)
    }

    fn splits(&self, storage: &dyn Storage, pattern: &str) -> Result<Vec<CombinedSplit>> {
        let files = storage.list(pattern)?;
        let singles = plan_splits(&WholeFilePolicy, &files, self.config.split_size);
        Ok(combine_splits(
            singles,
            self.config.max_files_per_split,
            self.config.max_split_bytes,
        ))
    }

    fn create_reader(
        &self,
        split: &CombinedSplit,
        storage: Arc<dyn Storage>,
    ) -> Result<Box<dyn RecordReader>> {
        Ok(Box::new(CombinedRecordReader::new(split, storage, &self.config)?))
    }
}
