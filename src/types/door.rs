// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Garage door states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Current or target state of a garage door.
///
/// Targets are only ever `Open` or `Closed`; the other variants appear
/// as current state while a transition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DoorState {
    /// Fully open.
    Open,
    /// Fully closed.
    Closed,
    /// Moving towards open.
    Opening,
    /// Moving towards closed.
    Closing,
    /// Stopped part way.
    Stopped,
}

impl DoorState {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closed => 1,
            Self::Opening => 2,
            Self::Closing => 3,
            Self::Stopped => 4,
        }
    }

    /// The transitional state shown while moving towards `self`.
    #[must_use]
    pub const fn transition_towards(&self) -> Self {
        match self {
            Self::Open | Self::Opening => Self::Opening,
            Self::Closed | Self::Closing => Self::Closing,
            Self::Stopped => Self::Stopped,
        }
    }
}

impl TryFrom<u8> for DoorState {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Open),
            1 => Ok(Self::Closed),
            2 => Ok(Self::Opening),
            3 => Ok(Self::Closing),
            4 => Ok(Self::Stopped),
            _ => Err(ValueError::invalid_state("door state", value)),
        }
    }
}

impl From<DoorState> for u8 {
    fn from(state: DoorState) -> Self {
        state.as_num()
    }
}

impl FromStr for DoorState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ValueError::invalid_state("garage door default state", s)),
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Opening => "OPENING",
            Self::Closing => "CLOSING",
            Self::Stopped => "STOPPED",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values() {
        assert_eq!(DoorState::Open.as_num(), 0);
        assert_eq!(DoorState::Stopped.as_num(), 4);
        assert_eq!(DoorState::try_from(3).unwrap(), DoorState::Closing);
        assert!(DoorState::try_from(5).is_err());
    }

    #[test]
    fn transition_direction() {
        assert_eq!(DoorState::Open.transition_towards(), DoorState::Opening);
        assert_eq!(DoorState::Closed.transition_towards(), DoorState::Closing);
    }

    #[test]
    fn only_resting_states_are_configurable() {
        assert_eq!("closed".parse::<DoorState>().unwrap(), DoorState::Closed);
        assert!("opening".parse::<DoorState>().is_err());
    }
}
