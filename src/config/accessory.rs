// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration of a single accessory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValueError};
use crate::types::{
    CoveringDefault, DoorState, LockState, Percentage, PowerState, SensorKind, TimeUnit, ValveType,
};

use super::FieldErrors;
use super::devices::{is_valid, parse_or_default};
use super::{
    CompanionSensorConfig, CompanionSwitchConfig, CronTriggerConfig, FanConfig, LightbulbConfig,
    PingTriggerConfig, SecuritySystemConfig, SunEventsTriggerConfig, TimerConfig, TriggerKind,
};

/// Longest valve run the host accepts, in seconds.
pub const MAX_VALVE_DURATION: i64 = 3600;

/// Kind of virtual accessory, selected by `accessoryType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessoryKind {
    /// Doorbell with optional companion switch.
    Doorbell,
    /// Fan.
    Fan,
    /// Garage door opener.
    GarageDoor,
    /// Dimmable lightbulb.
    Lightbulb,
    /// Lock mechanism.
    Lock,
    /// Security system.
    SecuritySystem,
    /// Trigger-driven sensor.
    Sensor,
    /// Switch with optional reset timer and companion sensor.
    Switch,
    /// Water valve with run timer.
    Valve,
    /// Window covering.
    WindowCovering,
}

impl AccessoryKind {
    /// Returns the configuration string for the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Doorbell => "doorbell",
            Self::Fan => "fan",
            Self::GarageDoor => "garagedoor",
            Self::Lightbulb => "lightbulb",
            Self::Lock => "lock",
            Self::SecuritySystem => "securitysystem",
            Self::Sensor => "sensor",
            Self::Switch => "switch",
            Self::Valve => "valve",
            Self::WindowCovering => "windowcovering",
        }
    }
}

impl FromStr for AccessoryKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doorbell" => Ok(Self::Doorbell),
            "fan" => Ok(Self::Fan),
            "garagedoor" => Ok(Self::GarageDoor),
            "lightbulb" => Ok(Self::Lightbulb),
            "lock" => Ok(Self::Lock),
            "securitysystem" => Ok(Self::SecuritySystem),
            "sensor" => Ok(Self::Sensor),
            "switch" => Ok(Self::Switch),
            "valve" => Ok(Self::Valve),
            "windowcovering" => Ok(Self::WindowCovering),
            _ => Err(ValueError::invalid_state("accessory type", s)),
        }
    }
}

impl fmt::Display for AccessoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of one virtual accessory, as written by the user.
///
/// Only the fields relevant to `accessoryType` are read. Call
/// [`validate`](Self::validate) before building an accessory; the typed
/// accessors below assume a validated configuration and fall back to
/// neutral defaults otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryConfig {
    /// Unique, stable identifier.
    #[serde(rename = "accessoryID", default)]
    pub accessory_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub accessory_name: Option<String>,
    /// Kind discriminant.
    #[serde(default)]
    pub accessory_type: Option<String>,
    /// Persist state across restarts.
    #[serde(default)]
    pub accessory_is_stateful: bool,
    /// Restore the default state after a delay.
    #[serde(default)]
    pub accessory_has_reset_timer: bool,
    /// Expose a companion sensor.
    #[serde(default)]
    pub accessory_has_companion_sensor: bool,
    /// Expose a companion switch (doorbells).
    #[serde(default)]
    pub accessory_has_companion_switch: bool,

    /// Switch default (`on`/`off`).
    #[serde(default)]
    pub switch_default_state: Option<String>,
    /// Lock default (`locked`/`unlocked`).
    #[serde(default)]
    pub lock_default_state: Option<String>,
    /// Lock hardware finish.
    #[serde(default)]
    pub lock_hardware_finish: Option<String>,
    /// Fan defaults.
    #[serde(default)]
    pub fan: Option<FanConfig>,
    /// Garage door default (`open`/`closed`).
    #[serde(default)]
    pub garage_door_default_state: Option<String>,
    /// Doorbell volume.
    #[serde(default)]
    pub doorbell_volume: Option<i64>,
    /// Lightbulb defaults.
    #[serde(default)]
    pub lightbulb: Option<LightbulbConfig>,
    /// Security system defaults.
    #[serde(default)]
    pub security_system: Option<SecuritySystemConfig>,
    /// Valve flavour.
    #[serde(default)]
    pub valve_type: Option<String>,
    /// Valve run duration in seconds.
    #[serde(default)]
    pub valve_duration: Option<i64>,
    /// Window covering default (`open`/`closed`).
    #[serde(default)]
    pub window_covering_default_state: Option<String>,
    /// Window covering travel time in seconds.
    #[serde(default)]
    pub transition_duration: Option<i64>,
    /// Sensor kind.
    #[serde(default)]
    pub sensor_type: Option<String>,
    /// Sensor trigger kind (`ping`, `cron`, `sunevents`).
    #[serde(default)]
    pub sensor_trigger: Option<String>,

    /// Reset timer settings.
    #[serde(default)]
    pub reset_timer: Option<TimerConfig>,
    /// Companion sensor settings.
    #[serde(default)]
    pub companion_sensor: Option<CompanionSensorConfig>,
    /// Companion switch settings.
    #[serde(default)]
    pub companion_switch: Option<CompanionSwitchConfig>,
    /// Ping trigger settings.
    #[serde(default)]
    pub ping_trigger: Option<PingTriggerConfig>,
    /// Cron trigger settings.
    #[serde(default)]
    pub cron_trigger: Option<CronTriggerConfig>,
    /// Sun events trigger settings.
    #[serde(default)]
    pub sun_events_trigger: Option<SunEventsTriggerConfig>,
}

impl AccessoryConfig {
    /// Creates a configuration with identity fields only.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: AccessoryKind) -> Self {
        Self {
            accessory_id: Some(id.into()),
            accessory_name: Some(name.into()),
            accessory_type: Some(kind.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Enables state persistence.
    #[must_use]
    pub fn stateful(mut self) -> Self {
        self.accessory_is_stateful = true;
        self
    }

    /// Adds a reset timer.
    #[must_use]
    pub fn with_reset_timer(mut self, timer: TimerConfig) -> Self {
        self.accessory_has_reset_timer = true;
        self.reset_timer = Some(timer);
        self
    }

    /// Adds a companion sensor.
    #[must_use]
    pub fn with_companion_sensor(mut self, name: impl Into<String>, kind: SensorKind) -> Self {
        self.accessory_has_companion_sensor = true;
        self.companion_sensor = Some(CompanionSensorConfig::new(name, kind));
        self
    }

    /// Returns the accessory identifier, or an empty string when missing.
    #[must_use]
    pub fn id(&self) -> &str {
        self.accessory_id.as_deref().unwrap_or_default()
    }

    /// Returns the display name, falling back to the identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        self.accessory_name.as_deref().unwrap_or_else(|| self.id())
    }

    /// Returns the parsed kind, if valid.
    #[must_use]
    pub fn kind(&self) -> Option<AccessoryKind> {
        self.accessory_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// Validates the configuration for its declared kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAccessoryType`] for an unrecognised
    /// type, or [`ConfigError::InvalidFields`] listing every invalid field.
    pub fn validate(&self) -> Result<AccessoryKind, ConfigError> {
        let mut errors = FieldErrors::default();
        errors.check(self.accessory_id.is_some(), "accessoryID");
        errors.check(self.accessory_name.is_some(), "accessoryName");
        errors.check(self.accessory_type.is_some(), "accessoryType");
        if self.accessory_is_stateful && self.accessory_has_reset_timer {
            errors.check(false, "accessoryIsStateful");
            errors.check(false, "accessoryHasResetTimer");
        }

        let kind = match self.accessory_type.as_deref() {
            Some(raw) => match raw.parse::<AccessoryKind>() {
                Ok(kind) => Some(kind),
                Err(_) => return Err(ConfigError::UnknownAccessoryType(raw.to_string())),
            },
            None => None,
        };

        if let Some(kind) = kind {
            self.validate_kind(kind, &mut errors);
        }

        match kind {
            Some(kind) if errors.is_empty() => Ok(kind),
            _ => Err(ConfigError::InvalidFields {
                accessory: self.name().to_string(),
                fields: errors.into_fields(),
            }),
        }
    }

    fn validate_kind(&self, kind: AccessoryKind, errors: &mut FieldErrors) {
        match kind {
            AccessoryKind::Doorbell => {
                errors.check(
                    self.doorbell_volume
                        .is_some_and(|v| Percentage::from_i64(v).is_ok()),
                    "doorbellVolume",
                );
            }
            AccessoryKind::Fan => match &self.fan {
                Some(fan) => errors.extend_scoped("fan", fan.validate()),
                None => {
                    errors.check(false, "fan");
                }
            },
            AccessoryKind::GarageDoor => {
                errors.check(
                    is_valid::<DoorState>(self.garage_door_default_state.as_deref()),
                    "garageDoorDefaultState",
                );
            }
            AccessoryKind::Lightbulb => match &self.lightbulb {
                Some(bulb) => errors.extend_scoped("lightbulb", bulb.validate()),
                None => {
                    errors.check(false, "lightbulb");
                }
            },
            AccessoryKind::Lock => {
                errors.check(
                    is_valid::<LockState>(self.lock_default_state.as_deref()),
                    "lockDefaultState",
                );
                errors.check(self.lock_hardware_finish.is_some(), "lockHardwareFinish");
            }
            AccessoryKind::SecuritySystem => match &self.security_system {
                Some(system) => errors.extend_scoped("securitySystem", system.validate()),
                None => {
                    errors.check(false, "securitySystem");
                }
            },
            AccessoryKind::Sensor => {
                errors.check(
                    is_valid::<SensorKind>(self.sensor_type.as_deref()),
                    "sensorType",
                );
                self.validate_sensor_trigger(errors);
            }
            AccessoryKind::Switch => {
                errors.check(
                    is_valid::<PowerState>(self.switch_default_state.as_deref()),
                    "switchDefaultState",
                );
                self.validate_reset_timer(errors);
                self.validate_companion_sensor(errors);
            }
            AccessoryKind::Valve => {
                errors.check(is_valid::<ValveType>(self.valve_type.as_deref()), "valveType");
                errors.check(
                    self.valve_duration
                        .is_some_and(|v| (0..=MAX_VALVE_DURATION).contains(&v)),
                    "valveDuration",
                );
            }
            AccessoryKind::WindowCovering => {
                errors.check(
                    is_valid::<CoveringDefault>(self.window_covering_default_state.as_deref()),
                    "windowCoveringDefaultState",
                );
                errors.check(
                    self.transition_duration.is_some_and(|v| v >= 0),
                    "transitionDuration",
                );
            }
        }
    }

    fn validate_reset_timer(&self, errors: &mut FieldErrors) {
        if !self.accessory_has_reset_timer {
            return;
        }
        match &self.reset_timer {
            Some(timer) => errors.extend_scoped("resetTimer", timer.validate()),
            None => {
                errors.check(false, "resetTimer");
            }
        }
    }

    fn validate_companion_sensor(&self, errors: &mut FieldErrors) {
        if !self.accessory_has_companion_sensor {
            return;
        }
        match &self.companion_sensor {
            Some(sensor) => errors.extend_scoped("companionSensor", sensor.validate()),
            None => {
                errors.check(false, "companionSensor");
            }
        }
    }

    fn validate_sensor_trigger(&self, errors: &mut FieldErrors) {
        let Some(raw) = self.sensor_trigger.as_deref() else {
            return;
        };
        let Ok(trigger) = raw.parse::<TriggerKind>() else {
            errors.check(false, "sensorTrigger");
            return;
        };
        let (scope, nested) = match trigger {
            TriggerKind::Ping => ("pingTrigger", self.ping_trigger.as_ref().map(PingTriggerConfig::validate)),
            TriggerKind::Cron => ("cronTrigger", self.cron_trigger.as_ref().map(CronTriggerConfig::validate)),
            TriggerKind::SunEvents => (
                "sunEventsTrigger",
                self.sun_events_trigger
                    .as_ref()
                    .map(SunEventsTriggerConfig::validate),
            ),
        };
        match nested {
            Some(nested) => errors.extend_scoped(scope, nested),
            None => {
                errors.check(false, scope);
            }
        }
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    /// Switch default state.
    #[must_use]
    pub fn switch_default_state(&self) -> PowerState {
        parse_or_default(self.switch_default_state.as_deref())
    }

    /// Lock default state (locked when invalid).
    #[must_use]
    pub fn lock_default_state(&self) -> LockState {
        self.lock_default_state
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LockState::Secured)
    }

    /// Garage door default state (closed when invalid).
    #[must_use]
    pub fn garage_door_default_state(&self) -> DoorState {
        self.garage_door_default_state
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DoorState::Closed)
    }

    /// Window covering default position (closed when invalid).
    #[must_use]
    pub fn window_covering_default_position(&self) -> Percentage {
        self.window_covering_default_state
            .as_deref()
            .and_then(|s| s.parse::<CoveringDefault>().ok())
            .map_or(Percentage::ZERO, |d| d.position())
    }

    /// Window covering travel time in seconds.
    #[must_use]
    pub fn transition_duration_secs(&self) -> u64 {
        self.transition_duration
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0)
    }

    /// Doorbell volume (full when invalid).
    #[must_use]
    pub fn doorbell_volume(&self) -> Percentage {
        self.doorbell_volume
            .and_then(|v| Percentage::from_i64(v).ok())
            .unwrap_or(Percentage::FULL)
    }

    /// Valve flavour.
    #[must_use]
    pub fn valve_type(&self) -> ValveType {
        parse_or_default(self.valve_type.as_deref())
    }

    /// Valve run duration in seconds.
    #[must_use]
    pub fn valve_duration_secs(&self) -> u64 {
        self.valve_duration
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0)
    }

    /// Sensor kind, if valid.
    #[must_use]
    pub fn sensor_kind(&self) -> Option<SensorKind> {
        self.sensor_type.as_deref().and_then(|s| s.parse().ok())
    }

    /// Sensor trigger kind, if configured and valid.
    #[must_use]
    pub fn trigger_kind(&self) -> Option<TriggerKind> {
        self.sensor_trigger.as_deref().and_then(|s| s.parse().ok())
    }

    /// Reset timer units, if configured.
    #[must_use]
    pub fn reset_timer_unit(&self) -> Option<TimeUnit> {
        self.reset_timer
            .as_ref()
            .and_then(|t| t.units.as_deref())
            .and_then(|u| u.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> AccessoryConfig {
        serde_json::from_value(value).unwrap()
    }

    fn invalid_fields(config: &AccessoryConfig) -> Vec<String> {
        match config.validate() {
            Err(ConfigError::InvalidFields { fields, .. }) => fields,
            other => panic!("expected invalid fields, got {other:?}"),
        }
    }

    #[test]
    fn minimal_switch_is_valid() {
        let config = parse(json!({
            "accessoryID": "1",
            "accessoryName": "Night",
            "accessoryType": "switch",
            "switchDefaultState": "on"
        }));
        assert_eq!(config.validate().unwrap(), AccessoryKind::Switch);
        assert_eq!(config.switch_default_state(), PowerState::On);
    }

    #[test]
    fn stateful_and_reset_timer_are_exclusive() {
        let config = AccessoryConfig {
            switch_default_state: Some("off".into()),
            ..AccessoryConfig::new("1", "Both", AccessoryKind::Switch)
                .stateful()
                .with_reset_timer(TimerConfig::fixed(5, "seconds"))
        };
        assert_eq!(
            invalid_fields(&config),
            vec!["accessoryIsStateful", "accessoryHasResetTimer"]
        );
    }

    #[test]
    fn missing_identity_is_collected() {
        let config = parse(json!({ "accessoryType": "lock", "lockHardwareFinish": "black" }));
        assert_eq!(
            invalid_fields(&config),
            vec!["accessoryID", "accessoryName", "lockDefaultState"]
        );
    }

    #[test]
    fn unknown_type() {
        let config = parse(json!({
            "accessoryID": "1",
            "accessoryName": "Thermo",
            "accessoryType": "thermostat"
        }));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownAccessoryType(t)) if t == "thermostat"
        ));
    }

    #[test]
    fn valve_bounds() {
        let config = parse(json!({
            "accessoryID": "v",
            "accessoryName": "Garden",
            "accessoryType": "valve",
            "valveType": "sprinkler",
            "valveDuration": 3601
        }));
        assert_eq!(invalid_fields(&config), vec!["valveType", "valveDuration"]);
    }

    #[test]
    fn nested_fields_are_scoped() {
        let config = parse(json!({
            "accessoryID": "f",
            "accessoryName": "Fan",
            "accessoryType": "fan",
            "fan": { "defaultState": "on", "rotationDirection": "clockwise", "rotationSpeed": 150 }
        }));
        assert_eq!(invalid_fields(&config), vec!["fan.rotationSpeed"]);
    }

    #[test]
    fn switch_companion_sensor_is_validated() {
        let config = parse(json!({
            "accessoryID": "s",
            "accessoryName": "Switch",
            "accessoryType": "switch",
            "switchDefaultState": "off",
            "accessoryHasCompanionSensor": true,
            "companionSensor": { "name": "Contact" }
        }));
        assert_eq!(invalid_fields(&config), vec!["companionSensor.type"]);
    }

    #[test]
    fn sensor_trigger_is_validated() {
        let config = parse(json!({
            "accessoryID": "p",
            "accessoryName": "Router",
            "accessoryType": "sensor",
            "sensorType": "contact",
            "sensorTrigger": "ping",
            "pingTrigger": { "host": "192.168.1.1" }
        }));
        assert_eq!(invalid_fields(&config), vec!["pingTrigger.failureRetryCount"]);
    }

    #[test]
    fn sensor_trigger_block_must_exist() {
        let config = parse(json!({
            "accessoryID": "c",
            "accessoryName": "Cron",
            "accessoryType": "sensor",
            "sensorType": "motion",
            "sensorTrigger": "cron"
        }));
        assert_eq!(invalid_fields(&config), vec!["cronTrigger"]);
    }

    #[test]
    fn typed_accessors() {
        let config = parse(json!({
            "accessoryID": "w",
            "accessoryName": "Blind",
            "accessoryType": "windowcovering",
            "windowCoveringDefaultState": "open",
            "transitionDuration": 7
        }));
        assert!(config.validate().is_ok());
        assert_eq!(config.window_covering_default_position(), Percentage::FULL);
        assert_eq!(config.transition_duration_secs(), 7);
    }
}
