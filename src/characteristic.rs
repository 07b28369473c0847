// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Characteristic vocabulary shared with the host.
//!
//! Accessories answer host reads and writes in terms of [`Characteristic`]
//! and [`CharacteristicValue`], and push unsolicited updates through the
//! event bus. The host adapter maps these onto its own protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A semantic characteristic exposed by an accessory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Characteristic {
    /// Power state of a switch, fan or lightbulb.
    On,
    /// Lightbulb brightness in percent.
    Brightness,
    /// Fan rotation direction.
    RotationDirection,
    /// Fan rotation speed in percent.
    RotationSpeed,
    /// Current lock mechanism state.
    LockCurrentState,
    /// Target lock mechanism state.
    LockTargetState,
    /// Free-form hardware finish of the lock.
    HardwareFinish,
    /// Current garage door state.
    CurrentDoorState,
    /// Target garage door state.
    TargetDoorState,
    /// Whether the garage door is obstructed.
    ObstructionDetected,
    /// Current window covering position.
    CurrentPosition,
    /// Target window covering position.
    TargetPosition,
    /// Window covering movement direction.
    PositionState,
    /// Valve active flag.
    Active,
    /// Valve in-use flag.
    InUse,
    /// Valve flavour.
    ValveType,
    /// Valve run duration in seconds.
    SetDuration,
    /// Seconds left before the valve closes.
    RemainingDuration,
    /// Current security system state.
    SecuritySystemCurrentState,
    /// Target security system state.
    SecuritySystemTargetState,
    /// Doorbell press event.
    ProgrammableSwitchEvent,
    /// Doorbell volume in percent.
    Volume,
    /// Contact sensor state.
    ContactSensorState,
    /// Motion sensor state.
    MotionDetected,
    /// Occupancy sensor state.
    OccupancyDetected,
    /// Leak sensor state.
    LeakDetected,
    /// Smoke sensor state.
    SmokeDetected,
    /// Carbon monoxide sensor state.
    CarbonMonoxideDetected,
    /// Carbon dioxide sensor state.
    CarbonDioxideDetected,
}

impl Characteristic {
    /// Returns the host-facing name of the characteristic.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Brightness => "Brightness",
            Self::RotationDirection => "RotationDirection",
            Self::RotationSpeed => "RotationSpeed",
            Self::LockCurrentState => "LockCurrentState",
            Self::LockTargetState => "LockTargetState",
            Self::HardwareFinish => "HardwareFinish",
            Self::CurrentDoorState => "CurrentDoorState",
            Self::TargetDoorState => "TargetDoorState",
            Self::ObstructionDetected => "ObstructionDetected",
            Self::CurrentPosition => "CurrentPosition",
            Self::TargetPosition => "TargetPosition",
            Self::PositionState => "PositionState",
            Self::Active => "Active",
            Self::InUse => "InUse",
            Self::ValveType => "ValveType",
            Self::SetDuration => "SetDuration",
            Self::RemainingDuration => "RemainingDuration",
            Self::SecuritySystemCurrentState => "SecuritySystemCurrentState",
            Self::SecuritySystemTargetState => "SecuritySystemTargetState",
            Self::ProgrammableSwitchEvent => "ProgrammableSwitchEvent",
            Self::Volume => "Volume",
            Self::ContactSensorState => "ContactSensorState",
            Self::MotionDetected => "MotionDetected",
            Self::OccupancyDetected => "OccupancyDetected",
            Self::LeakDetected => "LeakDetected",
            Self::SmokeDetected => "SmokeDetected",
            Self::CarbonMonoxideDetected => "CarbonMonoxideDetected",
            Self::CarbonDioxideDetected => "CarbonDioxideDetected",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A characteristic value as exchanged with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    /// Boolean characteristic (On, MotionDetected, ...).
    Bool(bool),
    /// Numeric or enumerated characteristic.
    Int(i64),
    /// Text characteristic.
    Text(String),
}

impl CharacteristicValue {
    /// Interprets the value as a boolean.
    ///
    /// Integers are accepted with the usual `0`/non-zero convention since
    /// some hosts send booleans as numbers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for text values.
    pub fn as_bool(&self, characteristic: Characteristic) -> Result<bool> {
        match self {
            Self::Bool(value) => Ok(*value),
            Self::Int(value) => Ok(*value != 0),
            Self::Text(text) => Err(Error::InvalidValue {
                characteristic,
                message: format!("expected a boolean, got '{text}'"),
            }),
        }
    }

    /// Interprets the value as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for text values.
    pub fn as_int(&self, characteristic: Characteristic) -> Result<i64> {
        match self {
            Self::Bool(value) => Ok(i64::from(*value)),
            Self::Int(value) => Ok(*value),
            Self::Text(text) => Err(Error::InvalidValue {
                characteristic,
                message: format!("expected a number, got '{text}'"),
            }),
        }
    }

    /// Interprets the value as an integer constrained to `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] when the value is not a number or
    /// falls outside the range.
    pub fn as_int_in(&self, characteristic: Characteristic, min: i64, max: i64) -> Result<i64> {
        let value = self.as_int(characteristic)?;
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(Error::InvalidValue {
                characteristic,
                message: format!("{value} is out of range [{min}, {max}]"),
            })
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u8> for CharacteristicValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for CharacteristicValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for CharacteristicValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<i64> for CharacteristicValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Which service of an accessory a characteristic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceRole {
    /// The accessory's main service.
    Primary,
    /// A sensor service derived from the primary state.
    CompanionSensor,
    /// A switch service that drives the primary service.
    CompanionSwitch,
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::CompanionSensor => "companion sensor",
            Self::CompanionSwitch => "companion switch",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_coerce_to_booleans() {
        assert!(CharacteristicValue::Int(1).as_bool(Characteristic::On).unwrap());
        assert!(!CharacteristicValue::Int(0).as_bool(Characteristic::On).unwrap());
    }

    #[test]
    fn text_is_not_a_number() {
        let err = CharacteristicValue::from("open")
            .as_int(Characteristic::TargetDoorState)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn range_check_rejects_out_of_bounds() {
        let value = CharacteristicValue::Int(101);
        assert!(value.as_int_in(Characteristic::Brightness, 0, 100).is_err());
        assert_eq!(
            CharacteristicValue::Int(100)
                .as_int_in(Characteristic::Brightness, 0, 100)
                .unwrap(),
            100
        );
    }

    #[test]
    fn untagged_serialization() {
        assert_eq!(serde_json::to_string(&CharacteristicValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&CharacteristicValue::Int(3)).unwrap(), "3");
    }
}
