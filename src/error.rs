//! Error type shared by every part of the whole-file input layer.
//!
//! Errors fall into two families that the host treats differently:
//!
//! - **Configuration** errors ([`InputError::FileTooLarge`], [`InputError::Config`], ...)
//!   are static properties of the job. Re-running the task cannot fix them.
//! - **I/O** errors ([`InputError::Io`], [`InputError::ShortRead`]) are failures of one
//!   task attempt. The host may retry the task with a fresh reader.
//!
//! Readers never retry internally; see [`crate::runner`] for the host-side policy.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, InputError>;

/// Coarse classification of an [`InputError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Static problem with the job or its inputs.
    Configuration,
    /// Failure while talking to storage.
    Io,
    /// Anything else (user record functions, runner bookkeeping).
    Other,
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("size of file {path} ({length} bytes) exceeds maximum record size of {limit} bytes")]
    FileTooLarge { path: String, length: u64, limit: u64 },

    #[error("short read on {path}: expected {expected} bytes, got {actual}")]
    ShortRead {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("not a regular file: {path}")]
    NotAFile { path: String },

    #[error("invalid glob pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("record reader used after close")]
    Closed,

    #[error("task for {split} failed after {attempts} attempt(s): {source}")]
    TaskFailed {
        split: String,
        attempts: u32,
        #[source]
        source: Box<InputError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InputError {
    /// Wrap a `std::io::Error` raised while accessing `path`.
    ///
    /// `NotFound` is lifted into [`InputError::NotFound`] so callers can match on it.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileTooLarge { .. }
            | Self::NotFound { .. }
            | Self::NotAFile { .. }
            | Self::InvalidPattern { .. }
            | Self::Config(_) => ErrorKind::Configuration,
            Self::ShortRead { .. } | Self::Io { .. } => ErrorKind::Io,
            Self::TaskFailed { source, .. } => source.kind(),
            Self::Closed | Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether a host may retry the task attempt that produced this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Io
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_lifted() {
        let err = InputError::io(
            "/a",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, InputError::NotFound { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn io_errors_are_retryable() {
        let err = InputError::io(
            "/a",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.is_retryable());

        let short = InputError::ShortRead {
            path: "/a".into(),
            expected: 20,
            actual: 10,
        };
        assert!(short.is_retryable());
    }

    #[test]
    fn file_too_large_message() {
        let err = InputError::FileTooLarge {
            path: "/big".into(),
            length: 17,
            limit: 16,
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("exceeds maximum record size"));
    }
}
