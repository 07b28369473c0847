// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Security system states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Arming state of a security system.
///
/// `AlarmTriggered` is only valid as a current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SecuritySystemState {
    /// Armed, occupants at home.
    StayArm,
    /// Armed, nobody home.
    AwayArm,
    /// Armed for the night.
    NightArm,
    /// Disarmed.
    Disarmed,
    /// Alarm is sounding.
    AlarmTriggered,
}

impl SecuritySystemState {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::StayArm => 0,
            Self::AwayArm => 1,
            Self::NightArm => 2,
            Self::Disarmed => 3,
            Self::AlarmTriggered => 4,
        }
    }
}

impl TryFrom<u8> for SecuritySystemState {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::StayArm),
            1 => Ok(Self::AwayArm),
            2 => Ok(Self::NightArm),
            3 => Ok(Self::Disarmed),
            4 => Ok(Self::AlarmTriggered),
            _ => Err(ValueError::invalid_state("security system state", value)),
        }
    }
}

impl From<SecuritySystemState> for u8 {
    fn from(state: SecuritySystemState) -> Self {
        state.as_num()
    }
}

impl FromStr for SecuritySystemState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stayarm" => Ok(Self::StayArm),
            "awayarm" => Ok(Self::AwayArm),
            "nightarm" => Ok(Self::NightArm),
            "disarmed" => Ok(Self::Disarmed),
            _ => Err(ValueError::invalid_state("security system default state", s)),
        }
    }
}

impl fmt::Display for SecuritySystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StayArm => "STAY_ARM",
            Self::AwayArm => "AWAY_ARM",
            Self::NightArm => "NIGHT_ARM",
            Self::Disarmed => "DISARMED",
            Self::AlarmTriggered => "ALARM_TRIGGERED",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_is_not_a_configurable_default() {
        assert!("alarm".parse::<SecuritySystemState>().is_err());
        assert_eq!(
            "nightarm".parse::<SecuritySystemState>().unwrap(),
            SecuritySystemState::NightArm
        );
    }

    #[test]
    fn numeric_round_values() {
        assert_eq!(SecuritySystemState::Disarmed.as_num(), 3);
        assert_eq!(
            SecuritySystemState::try_from(4).unwrap(),
            SecuritySystemState::AlarmTriggered
        );
    }
}
