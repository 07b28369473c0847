// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-accessory state file.
//!
//! Stateful accessories keep one JSON object on disk, keyed by semantic
//! field names such as `{"SwitchState": true}`. The file is read wholesale
//! at construction and overwritten wholesale on every state change.
//! Persistence is best effort: failures are logged and never undo the
//! in-memory change.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// File name prefix of accessory state files.
pub const STATE_FILE_PREFIX: &str = "VA4HB_";

/// Handle on the state file of one accessory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStorage {
    path: PathBuf,
}

impl StateStorage {
    /// Creates a handle for the accessory's file under `directory`.
    #[must_use]
    pub fn for_accessory(directory: impl AsRef<Path>, accessory_id: &str) -> Self {
        Self::new(
            directory
                .as_ref()
                .join(format!("{STATE_FILE_PREFIX}{accessory_id}.json")),
        )
    }

    /// Creates a handle for an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the stored state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain
    /// every field of `T`.
    pub fn read<T: DeserializeOwned>(&self) -> Result<T, StorageError> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads the stored state, or `None` when absent or incomplete.
    ///
    /// A missing file is the normal first-run case and is only logged at
    /// debug level.
    #[must_use]
    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        if !self.exists() {
            tracing::debug!(path = %self.path.display(), "No stored state");
            return None;
        }
        match self.read() {
            Ok(state) => {
                tracing::debug!(path = %self.path.display(), "Loaded stored state");
                Some(state)
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), "Ignoring stored state: {e}");
                None
            }
        }
    }

    /// Overwrites the file with `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized or written.
    pub fn write<T: Serialize>(&self, state: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(state)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Overwrites the file with `state`, logging failures.
    pub fn save<T: Serialize>(&self, state: &T) {
        match self.write(state) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Saved state"),
            Err(e) => tracing::error!(path = %self.path.display(), "Failed to save state: {e}"),
        }
    }

    /// Removes the file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<bool, StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the file if present, logging failures.
    pub fn delete(&self) {
        match self.remove() {
            Ok(true) => tracing::debug!(path = %self.path.display(), "Deleted stored state"),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(path = %self.path.display(), "Failed to delete stored state: {e}");
            }
        }
    }
}

/// Lists the accessory IDs that have a state file under `directory`.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn stored_accessory_ids(directory: impl AsRef<Path>) -> Result<Vec<String>, StorageError> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(directory.as_ref())? {
        let file_name = entry?.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if let Some(id) = name
            .strip_prefix(STATE_FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(".json"))
        {
            ids.push(id.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct SwitchRecord {
        #[serde(rename = "SwitchState")]
        on: bool,
    }

    #[derive(Debug, Deserialize)]
    struct FanRecord {
        #[serde(rename = "FanState")]
        _on: bool,
        #[serde(rename = "FanRotationSpeed")]
        _speed: u8,
    }

    #[test]
    fn file_name_uses_accessory_id() {
        let storage = StateStorage::for_accessory("/var/lib/va", "lamp-1");
        assert_eq!(storage.path(), Path::new("/var/lib/va/VA4HB_lamp-1.json"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StateStorage::for_accessory(dir.path(), "s");

        storage.save(&SwitchRecord { on: true });

        let raw = fs::read_to_string(storage.path()).unwrap();
        assert_eq!(raw, r#"{"SwitchState":true}"#);
        assert_eq!(storage.load::<SwitchRecord>(), Some(SwitchRecord { on: true }));
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StateStorage::for_accessory(dir.path(), "missing");
        assert_eq!(storage.load::<SwitchRecord>(), None);
    }

    #[test]
    fn missing_key_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StateStorage::for_accessory(dir.path(), "fan");
        fs::write(storage.path(), r#"{"FanState":true}"#).unwrap();

        assert!(storage.load::<FanRecord>().is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StateStorage::for_accessory(dir.path(), "gone");
        storage.save(&SwitchRecord { on: false });

        assert!(storage.remove().unwrap());
        assert!(!storage.remove().unwrap());
        storage.delete();
        assert!(!storage.exists());
    }

    #[test]
    fn lists_stored_accessories() {
        let dir = tempfile::tempdir().unwrap();
        StateStorage::for_accessory(dir.path(), "b").save(&SwitchRecord { on: true });
        StateStorage::for_accessory(dir.path(), "a").save(&SwitchRecord { on: false });
        fs::write(dir.path().join("other.json"), "{}").unwrap();

        assert_eq!(stored_accessory_ids(dir.path()).unwrap(), vec!["a", "b"]);
    }
}
