use super::{InputStream, Storage};
use crate::error::{InputError, Result};
use crate::split::InputFile;
use glob::glob;
use log::debug;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// The local filesystem.
///
/// Listing uses `glob` patterns (`logs/*.bin`, `data/**/*.png`) and skips
/// directories. Paths are qualified with [`std::fs::canonicalize`], so symlinks
/// and relative components resolve to one absolute key per file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

impl Storage for LocalStorage {
    fn list(&self, pattern: &str) -> Result<Vec<InputFile>> {
        let paths = glob(pattern).map_err(|e| InputError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    let at = display(e.path());
                    return Err(InputError::io(at, e.into_error()));
                }
            };
            let meta = match std::fs::metadata(&path) {
                Ok(meta) => meta,
                // Dangling symlink, or removed since the glob ran.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("skipping vanished entry {}", path.display());
                    continue;
                }
                Err(e) => return Err(InputError::io(display(&path), e)),
            };
            // Only include actual files, not directories
            if meta.is_file() {
                files.push(InputFile::new(display(&path), meta.len()));
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn status(&self, path: &str) -> Result<InputFile> {
        let meta = std::fs::metadata(path).map_err(|e| InputError::io(path, e))?;
        if !meta.is_file() {
            return Err(InputError::NotAFile {
                path: path.to_string(),
            });
        }
        Ok(InputFile::new(path, meta.len()))
    }

    fn qualify(&self, path: &str) -> Result<String> {
        let canonical = std::fs::canonicalize(path).map_err(|e| InputError::io(path, e))?;
        Ok(display(&canonical))
    }

    fn open(&self, path: &str, offset: u64) -> Result<Box<dyn InputStream>> {
        let mut file = File::open(path).map_err(|e| InputError::io(path, e))?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| InputError::io(path, e))?;
        }
        Ok(Box::new(LocalStream { file }))
    }
}

struct LocalStream {
    file: File,
}

impl Read for LocalStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

// The descriptor is released when the stream is dropped.
impl InputStream for LocalStream {}
