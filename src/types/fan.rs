// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan rotation direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Rotation direction of a fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RotationDirection {
    /// Clockwise.
    #[default]
    Clockwise,
    /// Counter-clockwise.
    CounterClockwise,
}

impl RotationDirection {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Clockwise => 0,
            Self::CounterClockwise => 1,
        }
    }
}

impl TryFrom<u8> for RotationDirection {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Clockwise),
            1 => Ok(Self::CounterClockwise),
            _ => Err(ValueError::invalid_state("rotation direction", value)),
        }
    }
}

impl From<RotationDirection> for u8 {
    fn from(direction: RotationDirection) -> Self {
        direction.as_num()
    }
}

impl FromStr for RotationDirection {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clockwise" => Ok(Self::Clockwise),
            "counterclockwise" => Ok(Self::CounterClockwise),
            _ => Err(ValueError::invalid_state("rotation direction", s)),
        }
    }
}

impl fmt::Display for RotationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clockwise => "CLOCKWISE",
            Self::CounterClockwise => "COUNTER_CLOCKWISE",
        };
        f.write_str(label)
    }
}
