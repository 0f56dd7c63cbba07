//! Storage capability consumed by the whole-file readers.
//!
//! Readers never reach for a process-wide filesystem handle. The host passes an
//! `Arc<dyn Storage>` when it creates a reader, which keeps readers independent
//! of each other and lets tests swap in [`MemoryStorage`].
//!
//! Two backends ship with the crate:
//! - [`LocalStorage`] - the local filesystem, with glob listing
//! - [`MemoryStorage`] - an in-memory fake with fault injection for tests
//!
//! Implementations must be `Send + Sync`: many readers on many worker threads
//! share one storage value. Their own concurrency safety is their concern.

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::{Fault, MemoryStorage};

use crate::error::Result;
use crate::split::InputFile;
use log::warn;
use std::io::{self, Read};

/// A readable stream over one file, positioned at the offset it was opened at.
pub trait InputStream: Read + Send {
    /// Release the stream. Called exactly once by the reader that opened it.
    ///
    /// # Errors
    /// Returns an error if the backend fails to release the underlying handle.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Operations the input layer needs from a storage system.
pub trait Storage: Send + Sync {
    /// List regular files matching a glob pattern, sorted by path.
    ///
    /// # Errors
    /// Returns [`crate::InputError::InvalidPattern`] for a malformed pattern, or an
    /// I/O error if listing fails. No matches is not an error.
    fn list(&self, pattern: &str) -> Result<Vec<InputFile>>;

    /// Describe a single file.
    ///
    /// # Errors
    /// Returns [`crate::InputError::NotFound`] if the file does not exist.
    fn status(&self, path: &str) -> Result<InputFile>;

    /// Canonical, fully qualified form of `path`.
    ///
    /// # Errors
    /// Returns an error if the path cannot be resolved.
    fn qualify(&self, path: &str) -> Result<String>;

    /// Open `path` for reading, starting at byte `offset`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or positioned.
    fn open(&self, path: &str, offset: u64) -> Result<Box<dyn InputStream>>;
}

/// Owns an open stream and guarantees it is closed exactly once.
///
/// [`ScopedStream::close`] surfaces close failures to the caller. If the guard is
/// dropped instead (an early return on a failed read), the stream is still closed
/// and any close error is logged, so it cannot mask the read error in flight.
pub(crate) struct ScopedStream {
    path: String,
    inner: Option<Box<dyn InputStream>>,
}

impl ScopedStream {
    pub(crate) fn new(path: impl Into<String>, stream: Box<dyn InputStream>) -> Self {
        Self {
            path: path.into(),
            inner: Some(stream),
        }
    }

    /// Fill `buf` from the stream, stopping early only at end of stream.
    ///
    /// Returns the number of bytes read; less than `buf.len()` means the stream ended.
    pub(crate) fn read_fully(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(stream) = self.inner.as_deref_mut() else {
            return Err(io::Error::other("stream already closed"));
        };
        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    pub(crate) fn close(mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(mut stream) => stream.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ScopedStream {
    fn drop(&mut self) {
        if let Some(mut stream) = self.inner.take()
            && let Err(e) = stream.close()
        {
            warn!("failed to close stream for {}: {e}", self.path);
        }
    }
}
