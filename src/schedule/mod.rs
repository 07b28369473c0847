// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Calendar scheduling primitives.
//!
//! Triggers schedule against wall-clock time in a configured IANA zone.
//! Time is read through a [`Clock`] so that schedules can be driven by
//! tokio's simulated time in tests.
//!
//! - [`CronSchedule`] - five-field, minute-granularity cron patterns
//! - [`parse_time_zone`] / [`parse_date_time_bound`] - trigger window bounds
//! - [`parse_clock_time`] - 12-hour clock strings from the solar data source

mod cron;
mod time;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

pub use cron::CronSchedule;
pub use time::{parse_clock_time, parse_date_time_bound, parse_time_zone};

/// Longest single sleep while waiting for a wall-clock instant.
///
/// Waking up periodically re-reads the clock, so a suspended host or a
/// clock adjustment delays a deadline by at most this much.
const MAX_SLEEP: Duration = Duration::from_secs(60);

/// Source of wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug + 'static {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that starts at a fixed instant and advances with the tokio timer.
///
/// Under `tokio::time::pause` the clock jumps forward exactly as far as
/// the runtime auto-advances, which lets calendar triggers run against
/// simulated time.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    origin: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl RuntimeClock {
    /// Creates a clock reading `origin` now.
    #[must_use]
    pub fn starting_at(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or(chrono::Duration::MAX);
        self.origin
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Returns how long until `target`, or zero if it has passed.
#[must_use]
pub fn duration_until<Tz: TimeZone>(clock: &dyn Clock, target: &DateTime<Tz>) -> Duration {
    target
        .with_timezone(&Utc)
        .signed_duration_since(clock.now())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Sleeps until the clock reads `target` or later.
pub async fn sleep_until<Tz: TimeZone>(clock: &dyn Clock, target: &DateTime<Tz>) {
    loop {
        let remaining = duration_until(clock, target);
        if remaining.is_zero() {
            return;
        }
        tokio::time::sleep(remaining.min(MAX_SLEEP)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runtime_clock_follows_paused_time() {
        let origin = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();
        let clock = RuntimeClock::starting_at(origin);
        assert_eq!(clock.now(), origin);

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), origin + chrono::Duration::seconds(90));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_until_crosses_long_waits() {
        let origin = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();
        let clock = RuntimeClock::starting_at(origin);
        let target = origin + chrono::Duration::minutes(10);

        sleep_until(&clock, &target).await;
        assert!(clock.now() >= target);
        assert!(clock.now() < target + chrono::Duration::seconds(1));
    }

    #[test]
    fn past_targets_are_due() {
        let clock = SystemClock;
        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(duration_until(&clock, &past), Duration::ZERO);
    }
}
