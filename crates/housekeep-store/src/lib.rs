//! docker-housekeep storage layer
//!
//! Persists the [`State`] as a single JSON file that is replaced atomically
//! on every update, so a reader never observes a half-written file.
//!
//! # Examples
//!
//! ```no_run
//! use housekeep_store::StateStore;
//!
//! let store = StateStore::new("/var/lib/docker-housekeep/state.json");
//! let state = store.load().unwrap();
//! store.persist(&state).unwrap();
//! ```

#![warn(missing_docs)]

use housekeep_domain::State;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the state file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// State file path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: io::Error,
    },

    /// The state file exists but does not hold a valid state
    ///
    /// Fatal at startup: proceeding with an empty state would silently
    /// forget every tracked image.
    #[error("Corrupt state file {}: {reason}", path.display())]
    Corrupt {
        /// State file path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The state could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed store for the tracker state
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store for the file at `path`
    ///
    /// Nothing is touched on disk until [`load`](Self::load) or
    /// [`persist`](Self::persist) is called.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state
    ///
    /// A missing or empty file yields a fresh state, the expected first-run
    /// condition.
    ///
    /// # Errors
    ///
    /// [`StoreError::Corrupt`] when the file has content that does not parse.
    pub fn load(&self) -> Result<State, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no state file, starting fresh");
                return Ok(State::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        if contents.trim().is_empty() {
            tracing::info!(path = %self.path.display(), "state file is empty, starting fresh");
            return Ok(State::new());
        }

        let state: State = serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            path = %self.path.display(),
            images = state.len(),
            watermark = ?state.watermark,
            "loaded state"
        );
        Ok(state)
    }

    /// Atomically replace the persisted state
    ///
    /// Writes a sibling temporary file, syncs it, renames it over the state
    /// file and syncs the directory before returning.
    pub fn persist(&self, state: &State) -> Result<(), StoreError> {
        let mut contents = serde_json::to_vec_pretty(state)?;
        contents.push(b'\n');

        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&contents).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        fsync_dir(&dir).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}
