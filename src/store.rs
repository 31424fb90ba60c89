//! On-disk store for uploaded and transformed images.
//!
//! A flat directory of files keyed by name. Every lookup goes through
//! [`ImageStore::resolve`], which rejects names that could escape the
//! directory (see [`naming::is_safe_name`]).
//!
//! There is no locking: two requests working on the same name can race
//! (e.g. a download deleting a file another request is transforming).
//! Callers see that as a `NotFound` or I/O error.

use crate::naming;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid filename: {0:?}")]
    InvalidName(String),
    #[error("File not found: {0}")]
    NotFound(String),
}

/// Flat directory of stored images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Write `bytes` to the freshly created file at `path`. On failure the
/// partial file is removed so no truncated upload keeps a valid name.
fn write_or_remove(path: &Path, mut file: impl Write, bytes: &[u8]) -> io::Result<()> {
    if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
        drop(file);
        if let Err(remove_err) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove_err, "failed to remove partial upload");
        }
        return Err(e);
    }
    Ok(())
}

impl ImageStore {
    /// Open the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for `name` inside the store. The file need not exist.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !naming::is_safe_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Path for `name`, which must exist as a regular file.
    pub fn existing(&self, name: &str) -> Result<PathBuf, StoreError> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Persist an upload under a fresh timestamp name and return that name.
    ///
    /// If the name for the current millisecond is taken, the timestamp is
    /// bumped until a free one is found.
    pub fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let mut millis = now_millis();
        loop {
            let name = naming::stored_name(original_name, millis);
            let path = self.root.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    write_or_remove(&path, file, bytes)?;
                    debug!(%name, original = original_name, bytes = bytes.len(), "stored upload");
                    return Ok(name);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => millis += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.existing(name)?;
        Ok(std::fs::read(path)?)
    }

    /// Write `bytes` under `name`, replacing any existing file.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.resolve(name)?;
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.existing(name)?;
        std::fs::remove_file(path)?;
        Ok(())
    }
}
