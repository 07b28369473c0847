// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Valve types and activity states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Flavour of a valve, shown by the host as different icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValveType {
    /// Generic valve.
    #[default]
    Generic,
    /// Irrigation zone.
    Irrigation,
    /// Shower head.
    ShowerHead,
    /// Water faucet.
    WaterFaucet,
}

impl ValveType {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Generic => 0,
            Self::Irrigation => 1,
            Self::ShowerHead => 2,
            Self::WaterFaucet => 3,
        }
    }
}

impl FromStr for ValveType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            "irrigation" => Ok(Self::Irrigation),
            "showerhead" => Ok(Self::ShowerHead),
            "waterfaucet" => Ok(Self::WaterFaucet),
            _ => Err(ValueError::invalid_state("valve type", s)),
        }
    }
}

impl fmt::Display for ValveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Generic => "GENERIC_VALVE",
            Self::Irrigation => "IRRIGATION",
            Self::ShowerHead => "SHOWER_HEAD",
            Self::WaterFaucet => "WATER_FAUCET",
        };
        f.write_str(label)
    }
}

/// Whether the valve has been asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ValveActive {
    /// Closed.
    #[default]
    Inactive,
    /// Open.
    Active,
}

impl ValveActive {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    /// The in-use flag implied by this activity.
    #[must_use]
    pub const fn in_use(&self) -> ValveInUse {
        match self {
            Self::Inactive => ValveInUse::NotInUse,
            Self::Active => ValveInUse::InUse,
        }
    }
}

impl TryFrom<u8> for ValveActive {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Inactive),
            1 => Ok(Self::Active),
            _ => Err(ValueError::invalid_state("valve active", value)),
        }
    }
}

impl From<ValveActive> for u8 {
    fn from(state: ValveActive) -> Self {
        state.as_num()
    }
}

impl fmt::Display for ValveActive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
        };
        f.write_str(label)
    }
}

/// Whether water is flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValveInUse {
    /// Idle.
    #[default]
    NotInUse,
    /// Flowing.
    InUse,
}

impl ValveInUse {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::NotInUse => 0,
            Self::InUse => 1,
        }
    }
}

impl fmt::Display for ValveInUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotInUse => "NOT_IN_USE",
            Self::InUse => "IN_USE",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_use_follows_active() {
        assert_eq!(ValveActive::Active.in_use(), ValveInUse::InUse);
        assert_eq!(ValveActive::Inactive.in_use(), ValveInUse::NotInUse);
    }

    #[test]
    fn valve_type_values() {
        assert_eq!("showerhead".parse::<ValveType>().unwrap().as_num(), 2);
        assert!("sprinkler".parse::<ValveType>().is_err());
    }
}
