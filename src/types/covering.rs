// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window covering movement state.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

use super::Percentage;

/// Direction a window covering is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PositionState {
    /// Closing.
    Decreasing,
    /// Opening.
    Increasing,
    /// At rest.
    #[default]
    Stopped,
}

impl PositionState {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Decreasing => 0,
            Self::Increasing => 1,
            Self::Stopped => 2,
        }
    }

    /// Movement needed to go from `current` to `target`.
    #[must_use]
    pub fn between(current: Percentage, target: Percentage) -> Self {
        match target.cmp(&current) {
            Ordering::Greater => Self::Increasing,
            Ordering::Less => Self::Decreasing,
            Ordering::Equal => Self::Stopped,
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Decreasing => "DECREASING",
            Self::Increasing => "INCREASING",
            Self::Stopped => "STOPPED",
        };
        f.write_str(label)
    }
}

/// Resting position configured as a window covering default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoveringDefault {
    /// Fully open (100%).
    Open,
    /// Fully closed (0%).
    Closed,
}

impl CoveringDefault {
    /// The position this default stands for.
    #[must_use]
    pub const fn position(&self) -> Percentage {
        match self {
            Self::Open => Percentage::FULL,
            Self::Closed => Percentage::ZERO,
        }
    }
}

impl FromStr for CoveringDefault {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ValueError::invalid_state("window covering default state", s)),
        }
    }
}
