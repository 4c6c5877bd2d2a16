//! JSON-file backing for [`MemoryState`].

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::MemoryState;
use crate::error::{StoreError, StoreResult};

/// Loads and saves the memory aggregate at a fixed path.
///
/// Loading fails soft (missing or malformed file → default state); saving
/// fails loud and replaces the file atomically.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    /// A store backed by the file at `path`. Nothing is touched until
    /// [`load`](Self::load) or [`save`](Self::save) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state from disk, or the default state if the file is absent,
    /// unreadable, or not a valid memory document.
    pub fn load(&self) -> MemoryState {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no memory file, starting empty");
                return MemoryState::default();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "memory file unreadable, starting empty"
                );
                return MemoryState::default();
            }
        };

        match serde_json::from_str(&data) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "memory file malformed, starting empty"
                );
                MemoryState::default()
            }
        }
    }

    /// Write the full state, atomically replacing the backing file.
    ///
    /// The JSON goes to a temporary file in the same directory which is
    /// synced and then renamed over the target, so readers see either the
    /// old or the new document, never a torn one.
    pub fn save(&self, state: &MemoryState) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(state).map_err(|e| StoreError::Serialize {
            message: e.to_string(),
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;

        tracing::debug!(path = %self.path.display(), "memory saved");
        Ok(())
    }

    /// Replace the stored state with the default empty state and return it.
    pub fn reset(&self) -> StoreResult<MemoryState> {
        let state = MemoryState::default();
        self.save(&state)?;
        tracing::info!(path = %self.path.display(), "memory reset");
        Ok(state)
    }
}
