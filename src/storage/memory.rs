//! In-memory storage for tests.
//!
//! State lives behind an `Arc<Mutex<_>>`, so clones share the same files, in the
//! same way as the fake cloud services. Faults can be injected per path to
//! exercise the reader's failure handling without a real failing disk.

use super::{InputStream, Storage};
use crate::error::{InputError, Result};
use crate::split::InputFile;
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A failure to inject when a path is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `open` fails with a connection error.
    Open,
    /// Reads fail with a connection error once this many bytes have been delivered.
    ReadAfter(u64),
    /// Reads succeed but `close` fails.
    Close,
}

#[derive(Debug, Clone, Copy)]
struct FaultSpec {
    fault: Fault,
    /// `None` fails every open; `Some(n)` fails the next `n` opens only.
    remaining: Option<u32>,
}

#[derive(Default)]
struct MemoryInner {
    files: BTreeMap<String, Arc<[u8]>>,
    faults: HashMap<String, Vec<FaultSpec>>,
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
    opened: Arc<AtomicU64>,
    closed: Arc<AtomicU64>,
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("files", &self.lock().files.len())
            .field("open_streams", &self.open_streams())
            .finish()
    }
}

/// Resolve `.`, `..` and repeated separators; the result always starts with `/`.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned lock only means another test thread panicked; the map is still usable.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Store `data` at `path`, replacing any previous content.
    pub fn put(&self, path: &str, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.lock().files.insert(normalize(path), data.into());
    }

    /// Remove a file. Returns `true` if it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.lock().files.remove(&normalize(path)).is_some()
    }

    /// Inject a fault on every open of `path`.
    ///
    /// Faults accumulate, so a read fault and a close fault can hit the same stream.
    pub fn fail(&self, path: &str, fault: Fault) {
        self.add_fault(path, fault, None);
    }

    /// Inject a fault on the next `times` opens of `path`; later opens succeed.
    pub fn fail_times(&self, path: &str, fault: Fault, times: u32) {
        self.add_fault(path, fault, Some(times));
    }

    fn add_fault(&self, path: &str, fault: Fault, remaining: Option<u32>) {
        self.lock()
            .faults
            .entry(normalize(path))
            .or_default()
            .push(FaultSpec { fault, remaining });
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Streams opened so far.
    #[must_use]
    pub fn opened_streams(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams opened but not yet closed.
    #[must_use]
    pub fn open_streams(&self) -> u64 {
        self.opened_streams() - self.closed.load(Ordering::SeqCst)
    }

    /// Faults that apply to one open of `key`, consuming transient ones.
    fn take_faults(&self, key: &str) -> Vec<Fault> {
        let mut inner = self.lock();
        let Some(specs) = inner.faults.get_mut(key) else {
            return Vec::new();
        };
        specs.retain(|spec| spec.remaining != Some(0));
        let active = specs
            .iter_mut()
            .map(|spec| {
                if let Some(n) = spec.remaining.as_mut() {
                    *n -= 1;
                }
                spec.fault
            })
            .collect();
        if specs.is_empty() {
            inner.faults.remove(key);
        }
        active
    }
}

impl Storage for MemoryStorage {
    fn list(&self, pattern: &str) -> Result<Vec<InputFile>> {
        let pat = Pattern::new(&normalize(pattern)).map_err(|e| InputError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;
        let opts = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::default()
        };
        // BTreeMap iteration is already sorted by path.
        Ok(self
            .lock()
            .files
            .iter()
            .filter(|(path, _)| pat.matches_with(path, opts))
            .map(|(path, data)| InputFile::new(path.clone(), data.len() as u64))
            .collect())
    }

    fn status(&self, path: &str) -> Result<InputFile> {
        let key = normalize(path);
        let len = self
            .lock()
            .files
            .get(&key)
            .map(|d| d.len() as u64)
            .ok_or_else(|| InputError::NotFound {
                path: path.to_string(),
            })?;
        Ok(InputFile::new(key, len))
    }

    fn qualify(&self, path: &str) -> Result<String> {
        Ok(normalize(path))
    }

    fn open(&self, path: &str, offset: u64) -> Result<Box<dyn InputStream>> {
        let key = normalize(path);
        let data = self
            .lock()
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| InputError::NotFound {
                path: path.to_string(),
            })?;

        let faults = self.take_faults(&key);
        if faults.contains(&Fault::Open) {
            return Err(InputError::io(
                path,
                io::Error::new(io::ErrorKind::ConnectionRefused, "injected open failure"),
            ));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        let pos = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        Ok(Box::new(MemoryStream {
            data,
            pos,
            delivered: 0,
            read_limit: faults.iter().find_map(|f| match f {
                Fault::ReadAfter(n) => Some(*n),
                _ => None,
            }),
            fail_close: faults.contains(&Fault::Close),
            closed: Arc::clone(&self.closed),
            is_closed: false,
        }))
    }
}

struct MemoryStream {
    data: Arc<[u8]>,
    pos: usize,
    delivered: u64,
    read_limit: Option<u64>,
    fail_close: bool,
    closed: Arc<AtomicU64>,
    is_closed: bool,
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut want = buf.len().min(self.data.len() - self.pos);
        if let Some(limit) = self.read_limit {
            let left = limit.saturating_sub(self.delivered);
            if left == 0 && want > 0 {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "injected read failure",
                ));
            }
            want = want.min(usize::try_from(left).unwrap_or(usize::MAX));
        }
        buf[..want].copy_from_slice(&self.data[self.pos..self.pos + want]);
        self.pos += want;
        self.delivered += want as u64;
        Ok(want)
    }
}

impl InputStream for MemoryStream {
    fn close(&mut self) -> io::Result<()> {
        if !self.is_closed {
            self.is_closed = true;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_close {
            return Err(io::Error::other("injected close failure"));
        }
        Ok(())
    }
}
