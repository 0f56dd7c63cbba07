//! Temporary on-disk fixtures.

use std::fs::{create_dir_all, write};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a file path within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }

    /// A glob pattern rooted at this directory, e.g. `pattern("*.bin")`.
    #[must_use]
    pub fn pattern(&self, glob: &str) -> String {
        format!("{}/{glob}", self.path.display())
    }
}

/// Write each `(relative name, bytes)` pair under `dir`, creating parent directories.
///
/// Returns the written paths in input order.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be created.
pub fn write_files(dir: &Path, files: &[(String, Vec<u8>)]) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(files.len());
    for (name, data) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(&path, data)?;
        paths.push(path);
    }
    Ok(paths)
}
