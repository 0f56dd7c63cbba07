//! Input files and the splits planned over them.
//!
//! A [`FileSplit`] is the unit of work handed to one task. Splits are plain data:
//! they are created once during planning, never mutated, and serialize with serde
//! so a host can ship them to workers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A file as reported by storage listing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFile {
    pub path: String,
    /// Length in bytes.
    pub length: u64,
}

impl InputFile {
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        Self {
            path: path.into(),
            length,
        }
    }
}

/// A byte range `[start, start + length)` of one file.
///
/// Whole-file splits always have `start == 0` and `length` equal to the file length.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSplit {
    pub path: String,
    pub start: u64,
    pub length: u64,
}

impl FileSplit {
    pub fn new(path: impl Into<String>, start: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            start,
            length,
        }
    }

    /// A split covering all of `file`.
    #[must_use]
    pub fn whole(file: &InputFile) -> Self {
        Self::new(file.path.clone(), 0, file.length)
    }
}

impl fmt::Display for FileSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}+{}", self.path, self.start, self.length)
    }
}

/// An ordered batch of whole-file splits processed by a single task.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedSplit {
    pub splits: Vec<FileSplit>,
}

impl CombinedSplit {
    pub fn new(splits: Vec<FileSplit>) -> Self {
        Self { splits }
    }

    /// Total bytes across all member splits.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.splits.iter().map(|s| s.length).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }
}

impl fmt::Display for CombinedSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.splits.as_slice() {
            [] => write!(f, "[]"),
            [only] => write!(f, "[{only}]"),
            [first, rest @ ..] => write!(f, "[{first} and {} more]", rest.len()),
        }
    }
}
