// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform and accessory configuration.
//!
//! Configuration arrives as the host's JSON document. Deserialization is
//! lenient (every field the user may omit is optional) and validation is
//! an explicit step that collects the name of every invalid field instead
//! of stopping at the first one.
//!
//! # Examples
//!
//! ```
//! use virtual_accessories::config::PlatformConfig;
//!
//! let config = PlatformConfig::from_json(r#"{
//!     "name": "Virtual Accessories",
//!     "devices": [{
//!         "accessoryID": "1",
//!         "accessoryName": "Night Mode",
//!         "accessoryType": "switch",
//!         "switchDefaultState": "off"
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(config.devices.len(), 1);
//! assert!(config.devices[0].validate().is_ok());
//! ```

mod accessory;
mod companion;
mod devices;
mod timer;
mod trigger;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use accessory::{AccessoryConfig, AccessoryKind, MAX_VALVE_DURATION};
pub use companion::{CompanionSensorConfig, CompanionSwitchConfig};
pub use devices::{FanConfig, LightbulbConfig, SecuritySystemConfig};
pub use timer::TimerConfig;
pub use trigger::{
    CronTriggerConfig, PingTriggerConfig, SunEvent, SunEventsTriggerConfig, TriggerKind,
};

/// Top-level configuration of the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Display name of the platform.
    #[serde(default)]
    pub name: Option<String>,
    /// Configured accessories.
    #[serde(default)]
    pub devices: Vec<AccessoryConfig>,
    /// Directory holding accessory state files.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

impl PlatformConfig {
    /// Parses the configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        tracing::info!(
            path = %path.as_ref().display(),
            devices = config.devices.len(),
            "Loaded platform configuration"
        );
        Ok(config)
    }

    /// Sets the storage directory.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Adds an accessory.
    #[must_use]
    pub fn with_device(mut self, device: AccessoryConfig) -> Self {
        self.devices.push(device);
        self
    }
}

/// Collects the names of fields that failed validation.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors {
    fields: Vec<String>,
}

impl FieldErrors {
    /// Records `field` when `valid` is false, returning `valid`.
    pub(crate) fn check(&mut self, valid: bool, field: &str) -> bool {
        if !valid {
            self.fields.push(field.to_string());
        }
        valid
    }

    /// Records every field of a nested validation, prefixed with `scope`.
    pub(crate) fn extend_scoped(&mut self, scope: &str, nested: FieldErrors) {
        self.fields
            .extend(nested.fields.into_iter().map(|f| format!("{scope}.{f}")));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_devices() {
        let config = PlatformConfig::from_json("{}").unwrap();
        assert!(config.devices.is_empty());
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(matches!(
            PlatformConfig::from_json("{\"devices\": 3}"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"storagePath": "/tmp/va", "devices": []}"#).unwrap();

        let config = PlatformConfig::from_file(&path).unwrap();
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/va")));
    }

    #[test]
    fn field_errors_keep_order() {
        let mut errors = FieldErrors::default();
        assert!(errors.check(true, "ok"));
        assert!(!errors.check(false, "first"));
        let mut nested = FieldErrors::default();
        nested.check(false, "inner");
        errors.extend_scoped("fan", nested);
        assert_eq!(errors.into_fields(), vec!["first", "fan.inner"]);
    }
}
