// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock mechanism states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Lock mechanism state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LockState {
    /// Unlocked.
    Unsecured,
    /// Locked.
    Secured,
    /// Jammed (current state only).
    Jammed,
    /// Unknown (current state only).
    Unknown,
}

impl LockState {
    /// Returns the HomeKit numeric value.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Unsecured => 0,
            Self::Secured => 1,
            Self::Jammed => 2,
            Self::Unknown => 3,
        }
    }
}

impl TryFrom<u8> for LockState {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unsecured),
            1 => Ok(Self::Secured),
            2 => Ok(Self::Jammed),
            3 => Ok(Self::Unknown),
            _ => Err(ValueError::invalid_state("lock state", value)),
        }
    }
}

impl From<LockState> for u8 {
    fn from(state: LockState) -> Self {
        state.as_num()
    }
}

impl FromStr for LockState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unlocked" => Ok(Self::Unsecured),
            "locked" => Ok(Self::Secured),
            _ => Err(ValueError::invalid_state("lock default state", s)),
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unsecured => "UNSECURED",
            Self::Secured => "SECURED",
            Self::Jammed => "JAMMED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_names() {
        assert_eq!("locked".parse::<LockState>().unwrap(), LockState::Secured);
        assert_eq!("unlocked".parse::<LockState>().unwrap(), LockState::Unsecured);
        assert!("jammed".parse::<LockState>().is_err());
    }

    #[test]
    fn persisted_as_number() {
        assert_eq!(serde_json::to_string(&LockState::Secured).unwrap(), "1");
    }
}
