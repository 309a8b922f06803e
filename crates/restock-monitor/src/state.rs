//! Last observed availability per variant, kept in a small JSON file.
//!
//! File shape: `{"<variant id>": {"available": bool, "ts": <unix seconds>}}`.
//! A missing or unreadable file is an empty state, never an error: the worst
//! case is one extra notification on the next run.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub available: bool,
    #[serde(default)]
    pub ts: i64,
}

/// Every record in the state file, keyed by variant id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    records: BTreeMap<String, PersistedState>,
}

impl StateSnapshot {
    #[must_use]
    pub fn get(&self, variant_id: i64) -> Option<PersistedState> {
        self.records.get(&variant_id.to_string()).copied()
    }

    /// Replaces the record for `variant_id`; other variants are kept.
    pub fn record(&mut self, variant_id: i64, available: bool, ts: i64) {
        self.records
            .insert(variant_id.to_string(), PersistedState { available, ts });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state file. Missing or corrupt files yield an empty snapshot.
    #[must_use]
    pub fn load(&self) -> StateSnapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file yet");
                return StateSnapshot::default();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "state file unreadable; starting empty"
                );
                return StateSnapshot::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "state file corrupt; starting empty"
                );
                StateSnapshot::default()
            }
        }
    }

    /// Writes `snapshot` to a sibling temp file, then renames it over the
    /// state file. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if serialization or any filesystem step fails.
    /// The temp file is removed on failure.
    pub fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let write_temp = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        };

        write_temp().map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_err(e)
        })
    }
}
