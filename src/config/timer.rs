// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reset timer configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::FieldErrors;

/// How long a reset timer runs before restoring the default state.
///
/// Either a fixed `duration` or, with `durationIsRandom`, a duration drawn
/// uniformly from `durationRandomMin..=durationRandomMax` on every start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    /// Whether the duration is drawn at random.
    #[serde(default)]
    pub duration_is_random: bool,
    /// Fixed duration.
    #[serde(default)]
    pub duration: Option<i64>,
    /// Lower bound of the random duration.
    #[serde(default)]
    pub duration_random_min: Option<i64>,
    /// Upper bound of the random duration.
    #[serde(default)]
    pub duration_random_max: Option<i64>,
    /// Unit of the duration (`seconds`, `minutes`, `hours`, `days`).
    #[serde(default)]
    pub units: Option<String>,
    /// Whether re-triggering restarts a running countdown.
    #[serde(default)]
    pub is_resettable: bool,
}

impl TimerConfig {
    /// Creates a fixed-duration timer configuration.
    #[must_use]
    pub fn fixed(duration: i64, units: impl Into<String>) -> Self {
        Self {
            duration: Some(duration),
            units: Some(units.into()),
            ..Self::default()
        }
    }

    /// Creates a random-duration timer configuration.
    #[must_use]
    pub fn random(min: i64, max: i64, units: impl Into<String>) -> Self {
        Self {
            duration_is_random: true,
            duration_random_min: Some(min),
            duration_random_max: Some(max),
            units: Some(units.into()),
            ..Self::default()
        }
    }

    /// Marks the timer as resettable.
    #[must_use]
    pub fn resettable(mut self) -> Self {
        self.is_resettable = true;
        self
    }

    /// Returns the configured units, or an empty string when absent.
    #[must_use]
    pub fn units(&self) -> &str {
        self.units.as_deref().unwrap_or_default()
    }

    /// Picks the duration amount for one timer start.
    ///
    /// Random durations are drawn uniformly from the inclusive range.
    /// Missing or negative values count as zero.
    pub fn draw_amount<R: Rng>(&self, rng: &mut R) -> u64 {
        let clamp = |value: Option<i64>| u64::try_from(value.unwrap_or(0)).unwrap_or(0);
        if self.duration_is_random {
            let min = clamp(self.duration_random_min);
            let max = clamp(self.duration_random_max).max(min);
            rng.gen_range(min..=max)
        } else {
            clamp(self.duration)
        }
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if self.duration_is_random {
            let min_ok =
                errors.check(self.duration_random_min.is_some_and(|v| v >= 0), "durationRandomMin");
            let max_ok =
                errors.check(self.duration_random_max.is_some_and(|v| v >= 0), "durationRandomMax");
            if min_ok && max_ok && self.duration_random_min >= self.duration_random_max {
                errors.check(false, "durationRandomMin");
                errors.check(false, "durationRandomMax");
            }
        } else {
            errors.check(self.duration.is_some_and(|v| v >= 0), "duration");
        }
        errors.check(self.units.is_some(), "units");
        errors
    }
}
