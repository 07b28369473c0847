// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nested per-kind configuration blocks.

use serde::{Deserialize, Serialize};

use crate::types::{Percentage, PowerState, RotationDirection, SecuritySystemState};

use super::FieldErrors;

fn is_percentage(value: Option<i64>) -> bool {
    value.is_some_and(|v| Percentage::from_i64(v).is_ok())
}

/// Fan defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanConfig {
    /// `on` or `off`.
    #[serde(default)]
    pub default_state: Option<String>,
    /// `clockwise` or `counterclockwise`.
    #[serde(default)]
    pub rotation_direction: Option<String>,
    /// Speed in percent.
    #[serde(default)]
    pub rotation_speed: Option<i64>,
}

impl FanConfig {
    /// Parsed default power state (off when invalid).
    #[must_use]
    pub fn default_state(&self) -> PowerState {
        parse_or_default(self.default_state.as_deref())
    }

    /// Parsed default rotation direction (clockwise when invalid).
    #[must_use]
    pub fn rotation_direction(&self) -> RotationDirection {
        parse_or_default(self.rotation_direction.as_deref())
    }

    /// Default speed (0 when invalid).
    #[must_use]
    pub fn rotation_speed(&self) -> Percentage {
        self.rotation_speed
            .and_then(|v| Percentage::from_i64(v).ok())
            .unwrap_or_default()
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(is_valid::<PowerState>(self.default_state.as_deref()), "defaultState");
        errors.check(
            is_valid::<RotationDirection>(self.rotation_direction.as_deref()),
            "rotationDirection",
        );
        errors.check(is_percentage(self.rotation_speed), "rotationSpeed");
        errors
    }
}

/// Lightbulb defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightbulbConfig {
    /// `on` or `off`.
    #[serde(default)]
    pub default_state: Option<String>,
    /// Brightness in percent.
    #[serde(default)]
    pub brightness: Option<i64>,
}

impl LightbulbConfig {
    /// Parsed default power state (off when invalid).
    #[must_use]
    pub fn default_state(&self) -> PowerState {
        parse_or_default(self.default_state.as_deref())
    }

    /// Default brightness (full when invalid).
    #[must_use]
    pub fn brightness(&self) -> Percentage {
        self.brightness
            .and_then(|v| Percentage::from_i64(v).ok())
            .unwrap_or(Percentage::FULL)
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(is_valid::<PowerState>(self.default_state.as_deref()), "defaultState");
        errors.check(is_percentage(self.brightness), "brightness");
        errors
    }
}

/// Security system defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySystemConfig {
    /// `stayarm`, `awayarm`, `nightarm` or `disarmed`.
    #[serde(default)]
    pub default_state: Option<String>,
}

impl SecuritySystemConfig {
    /// Parsed default state (disarmed when invalid).
    #[must_use]
    pub fn default_state(&self) -> SecuritySystemState {
        self.default_state
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(SecuritySystemState::Disarmed)
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(
            is_valid::<SecuritySystemState>(self.default_state.as_deref()),
            "defaultState",
        );
        errors
    }
}

pub(crate) fn is_valid<T: std::str::FromStr>(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.parse::<T>().is_ok())
}

pub(crate) fn parse_or_default<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or_default()
}
