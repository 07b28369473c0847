// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor kinds and their two-valued state.

use std::fmt;
use std::str::FromStr;

use crate::characteristic::{Characteristic, CharacteristicValue};
use crate::error::ValueError;

/// Normalised state of any virtual sensor.
///
/// Each [`SensorKind`] maps these onto its own characteristic encoding
/// (for a contact sensor `Normal` is "contact detected", for a motion
/// sensor it is "no motion").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SensorState {
    /// Closed / not detected.
    #[default]
    Normal,
    /// Open / detected.
    Triggered,
}

impl SensorState {
    /// Returns the numeric encoding shared by the HomeKit sensor characteristics.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Triggered => 1,
        }
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Normal => "NORMAL",
            Self::Triggered => "TRIGGERED",
        };
        f.write_str(label)
    }
}

/// Derives a companion sensor state from its owner's primary state.
///
/// The sensor is `Normal` exactly when the primary state equals the
/// configured default, and `Triggered` otherwise.
///
/// # Examples
///
/// ```
/// use virtual_accessories::types::{determine_sensor_state, PowerState, SensorState};
///
/// assert_eq!(determine_sensor_state(&PowerState::Off, &PowerState::Off), SensorState::Normal);
/// assert_eq!(determine_sensor_state(&PowerState::On, &PowerState::Off), SensorState::Triggered);
/// ```
#[must_use]
pub fn determine_sensor_state<T: PartialEq>(current: &T, default: &T) -> SensorState {
    if current == default {
        SensorState::Normal
    } else {
        SensorState::Triggered
    }
}

/// The kind of a virtual sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Carbon dioxide detector.
    CarbonDioxide,
    /// Carbon monoxide detector.
    CarbonMonoxide,
    /// Door/window contact.
    Contact,
    /// Water leak detector.
    Leak,
    /// Motion detector.
    Motion,
    /// Occupancy detector.
    Occupancy,
    /// Smoke detector.
    Smoke,
}

impl SensorKind {
    /// Returns the configuration string for the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CarbonDioxide => "carbonDioxide",
            Self::CarbonMonoxide => "carbonMonoxide",
            Self::Contact => "contact",
            Self::Leak => "leak",
            Self::Motion => "motion",
            Self::Occupancy => "occupancy",
            Self::Smoke => "smoke",
        }
    }

    /// Returns the characteristic that carries this sensor's state.
    #[must_use]
    pub const fn characteristic(&self) -> Characteristic {
        match self {
            Self::CarbonDioxide => Characteristic::CarbonDioxideDetected,
            Self::CarbonMonoxide => Characteristic::CarbonMonoxideDetected,
            Self::Contact => Characteristic::ContactSensorState,
            Self::Leak => Characteristic::LeakDetected,
            Self::Motion => Characteristic::MotionDetected,
            Self::Occupancy => Characteristic::OccupancyDetected,
            Self::Smoke => Characteristic::SmokeDetected,
        }
    }

    /// Encodes a sensor state the way this kind's characteristic expects.
    #[must_use]
    pub fn encode(&self, state: SensorState) -> CharacteristicValue {
        match self {
            Self::Motion => CharacteristicValue::Bool(state == SensorState::Triggered),
            _ => CharacteristicValue::from(state.as_num()),
        }
    }

    /// Human-readable name of a state for this kind, used in logs.
    #[must_use]
    pub const fn state_name(&self, state: SensorState) -> &'static str {
        match (self, state) {
            (Self::CarbonDioxide | Self::CarbonMonoxide, SensorState::Normal) => "LEVELS_NORMAL",
            (Self::CarbonDioxide | Self::CarbonMonoxide, SensorState::Triggered) => {
                "LEVELS_ABNORMAL"
            }
            (Self::Contact, SensorState::Normal) => "CONTACT_DETECTED",
            (Self::Contact, SensorState::Triggered) => "CONTACT_NOT_DETECTED",
            (Self::Leak, SensorState::Normal) => "LEAK_NOT_DETECTED",
            (Self::Leak, SensorState::Triggered) => "LEAK_DETECTED",
            (Self::Motion, SensorState::Normal) => "NOT_DETECTED",
            (Self::Motion, SensorState::Triggered) => "DETECTED",
            (Self::Occupancy, SensorState::Normal) => "OCCUPANCY_NOT_DETECTED",
            (Self::Occupancy, SensorState::Triggered) => "OCCUPANCY_DETECTED",
            (Self::Smoke, SensorState::Normal) => "SMOKE_NOT_DETECTED",
            (Self::Smoke, SensorState::Triggered) => "SMOKE_DETECTED",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carbonDioxide" => Ok(Self::CarbonDioxide),
            "carbonMonoxide" => Ok(Self::CarbonMonoxide),
            "contact" => Ok(Self::Contact),
            "leak" => Ok(Self::Leak),
            "motion" => Ok(Self::Motion),
            "occupancy" => Ok(Self::Occupancy),
            "smoke" => Ok(Self::Smoke),
            _ => Err(ValueError::invalid_state("sensor type", s)),
        }
    }
}
