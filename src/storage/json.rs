//! JSON file checkpoint backend

use super::traits::{CheckpointError, CheckpointResult, CheckpointStore};
use crate::model::{BatchOutcomes, Snapshot};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Checkpoint persisted as a single flat JSON object.
///
/// Flushes write a sibling `.tmp` file and rename it over the target, so the
/// on-disk checkpoint is always either the previous or the new version.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    snapshot: Snapshot,
}

impl JsonFileStore {
    /// Bind a store to `path`. Nothing is read until [`CheckpointStore::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: Snapshot::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl CheckpointStore for JsonFileStore {
    fn load(&mut self) -> CheckpointResult<&Snapshot> {
        self.snapshot = match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| {
                CheckpointError::Serialization {
                    path: self.path.display().to_string(),
                    source,
                }
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => Snapshot::new(),
            Err(e) => return Err(self.io_error(e)),
        };
        debug!(path = %self.path.display(), entries = self.snapshot.len(), "checkpoint loaded");
        Ok(&self.snapshot)
    }

    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn merge(&mut self, outcomes: BatchOutcomes) {
        self.snapshot.merge(outcomes);
    }

    fn flush(&mut self) -> CheckpointResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let payload = serde_json::to_vec(&self.snapshot).map_err(|source| {
            CheckpointError::Serialization {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(&payload).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), entries = self.snapshot.len(), "checkpoint flushed");
        Ok(())
    }
}
