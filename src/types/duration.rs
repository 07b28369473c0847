// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time units used by reset timers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ValueError;

/// Unit of a configured timer duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl TimeUnit {
    /// Number of seconds in one unit.
    #[must_use]
    pub const fn seconds(&self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
            Self::Days => 24 * 60 * 60,
        }
    }

    /// Converts `amount` of this unit into a duration, saturating on overflow.
    #[must_use]
    pub const fn to_duration(&self, amount: u64) -> Duration {
        Duration::from_secs(amount.saturating_mul(self.seconds()))
    }

    /// Returns the configuration string for the unit.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seconds" => Ok(Self::Seconds),
            "minutes" => Ok(Self::Minutes),
            "hours" => Ok(Self::Hours),
            "days" => Ok(Self::Days),
            _ => Err(ValueError::invalid_state("time unit", s)),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversion() {
        assert_eq!(TimeUnit::Days.to_duration(1).as_secs(), 86_400);
        assert_eq!(TimeUnit::Hours.to_duration(2).as_secs(), 7_200);
        assert_eq!(TimeUnit::Minutes.to_duration(3).as_secs(), 180);
        assert_eq!(TimeUnit::Seconds.to_duration(30).as_secs(), 30);
    }

    #[test]
    fn conversion_saturates() {
        assert_eq!(TimeUnit::Days.to_duration(u64::MAX).as_secs(), u64::MAX);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!("weeks".parse::<TimeUnit>().is_err());
    }
}
