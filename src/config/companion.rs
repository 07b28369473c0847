// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Companion service configuration.

use serde::{Deserialize, Serialize};

use crate::types::SensorKind;

use super::FieldErrors;

/// A sensor exposed next to the primary service and derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionSensorConfig {
    /// Service name.
    #[serde(default)]
    pub name: Option<String>,
    /// Sensor kind (`contact`, `motion`, ...).
    #[serde(default, rename = "type")]
    pub sensor_type: Option<String>,
}

impl CompanionSensorConfig {
    /// Creates a companion sensor configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            name: Some(name.into()),
            sensor_type: Some(kind.as_str().to_string()),
        }
    }

    /// Returns the parsed sensor kind, if valid.
    #[must_use]
    pub fn kind(&self) -> Option<SensorKind> {
        self.sensor_type.as_deref().and_then(|t| t.parse().ok())
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(self.name.is_some(), "name");
        errors.check(self.kind().is_some(), "type");
        errors
    }
}

/// A switch exposed next to a doorbell that rings it when turned on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionSwitchConfig {
    /// Service name.
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_shape() {
        let config: CompanionSensorConfig =
            serde_json::from_str(r#"{"name": "Door", "type": "contact"}"#).unwrap();
        assert_eq!(config.kind(), Some(SensorKind::Contact));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn unknown_type_is_invalid() {
        let config: CompanionSensorConfig =
            serde_json::from_str(r#"{"type": "humidity"}"#).unwrap();
        assert_eq!(config.validate().into_fields(), vec!["name", "type"]);
    }
}
