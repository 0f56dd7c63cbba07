//! Tunables for whole-file input.
//!
//! [`InputConfig`] is a plain struct with public fields and a [`Default`], in the
//! same shape as the runner and checkpoint configs elsewhere in Ironbeam. It can
//! also be loaded from JSON; missing fields take their defaults.
//!
//! ```
//! use ironbeam_wholefile::InputConfig;
//!
//! let cfg = InputConfig::default().with_max_record_size(1 << 20);
//! assert_eq!(cfg.max_record_size, 1 << 20);
//!
//! let cfg = InputConfig::from_json_str(r#"{ "max_task_attempts": 2 }"#)?;
//! assert_eq!(cfg.max_task_attempts, 2);
//! assert_eq!(cfg.max_record_size, i32::MAX as u64);
//! # Ok::<(), ironbeam_wholefile::InputError>(())
//! ```

use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Historical single-buffer bound: the largest length a signed 32-bit integer can address.
pub const DEFAULT_MAX_RECORD_SIZE: u64 = i32::MAX as u64;

const MIB: u64 = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Largest file, in bytes, that may be turned into a single record.
    pub max_record_size: u64,
    /// Split size used for files whose policy allows splitting.
    pub split_size: u64,
    /// Upper bound on files packed into one combined split.
    pub max_files_per_split: usize,
    /// Upper bound on total bytes packed into one combined split.
    pub max_split_bytes: u64,
    /// Attempts per task in the local runner, including the first one.
    pub max_task_attempts: u32,
    /// Worker threads for parallel execution. `None` uses the rayon default.
    pub parallelism: Option<usize>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            split_size: 128 * MIB,
            max_files_per_split: 64,
            max_split_bytes: 256 * MIB,
            max_task_attempts: 4,
            parallelism: None,
        }
    }
}

impl InputConfig {
    /// Parse a JSON document and validate it.
    ///
    /// # Errors
    /// Returns [`InputError::Config`] if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| InputError::Config(format!("parse input config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON config file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or [`InputError::Config`]
    /// if its contents are invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| InputError::io(path.display().to_string(), e))?;
        Self::from_json_str(&text)
    }

    /// Reject values that would make planning or reading impossible.
    ///
    /// # Errors
    /// Returns [`InputError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let zero = |name: &str| Err(InputError::Config(format!("{name} must be greater than zero")));
        if self.max_record_size == 0 {
            return zero("max_record_size");
        }
        if self.split_size == 0 {
            return zero("split_size");
        }
        if self.max_files_per_split == 0 {
            return zero("max_files_per_split");
        }
        if self.max_split_bytes == 0 {
            return zero("max_split_bytes");
        }
        if self.max_task_attempts == 0 {
            return zero("max_task_attempts");
        }
        if self.parallelism == Some(0) {
            return zero("parallelism");
        }
        Ok(())
    }

    #[must_use]
    pub fn with_max_record_size(mut self, bytes: u64) -> Self {
        self.max_record_size = bytes;
        self
    }

    #[must_use]
    pub fn with_split_size(mut self, bytes: u64) -> Self {
        self.split_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_files_per_split(mut self, files: usize) -> Self {
        self.max_files_per_split = files;
        self
    }

    #[must_use]
    pub fn with_max_split_bytes(mut self, bytes: u64) -> Self {
        self.max_split_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_max_task_attempts(mut self, attempts: u32) -> Self {
        self.max_task_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
}
