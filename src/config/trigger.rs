// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor trigger configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::schedule::{CronSchedule, parse_date_time_bound, parse_time_zone};

use super::FieldErrors;

static LATITUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?([1-8]?\d(\.\d+)?|90(\.0+)?)$").expect("latitude pattern is valid")
});

static LONGITUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(180(\.0+)?|((1[0-7]\d)|([1-9]?\d))(\.\d+)?)$")
        .expect("longitude pattern is valid")
});

/// Which trigger drives a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Network reachability probe.
    Ping,
    /// Cron schedule.
    Cron,
    /// Sunrise, sunset or golden hour.
    SunEvents,
}

impl FromStr for TriggerKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ping" => Ok(Self::Ping),
            "cron" => Ok(Self::Cron),
            "sunevents" => Ok(Self::SunEvents),
            _ => Err(ValueError::invalid_state("sensor trigger", s)),
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ping => "ping",
            Self::Cron => "cron",
            Self::SunEvents => "sunevents",
        };
        f.write_str(label)
    }
}

/// Reachability trigger settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingTriggerConfig {
    /// IP address or host name to probe.
    #[serde(default)]
    pub host: Option<String>,
    /// Consecutive failures needed to trigger the sensor.
    #[serde(default)]
    pub failure_retry_count: Option<i64>,
    /// Never arm the trigger.
    #[serde(default)]
    pub is_disabled: bool,
}

impl PingTriggerConfig {
    /// Creates an enabled ping trigger configuration.
    #[must_use]
    pub fn new(host: impl Into<String>, failure_retry_count: u32) -> Self {
        Self {
            host: Some(host.into()),
            failure_retry_count: Some(i64::from(failure_retry_count)),
            is_disabled: false,
        }
    }

    /// Failure threshold (1 when missing or invalid).
    #[must_use]
    pub fn failure_threshold(&self) -> u32 {
        self.failure_retry_count
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(1)
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(
            self.host.as_deref().is_some_and(|h| !h.trim().is_empty()),
            "host",
        );
        errors.check(
            self.failure_retry_count.is_some_and(|v| v >= 1),
            "failureRetryCount",
        );
        errors
    }
}

/// Cron trigger settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronTriggerConfig {
    /// Five-field cron pattern.
    #[serde(default)]
    pub pattern: Option<String>,
    /// IANA time zone the pattern and bounds are evaluated in.
    #[serde(default)]
    pub zone_id: Option<String>,
    /// First instant at which ticks may pulse.
    #[serde(default)]
    pub start_date_time: Option<String>,
    /// Instant after which the schedule stops.
    #[serde(default)]
    pub end_date_time: Option<String>,
    /// Suppress the per-tick log lines.
    #[serde(default)]
    pub disable_trigger_event_logging: bool,
    /// Never arm the trigger.
    #[serde(default)]
    pub is_disabled: bool,
}

impl CronTriggerConfig {
    /// Creates an enabled cron trigger configuration.
    #[must_use]
    pub fn new(pattern: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            zone_id: Some(zone_id.into()),
            ..Self::default()
        }
    }

    /// Sets the start bound.
    #[must_use]
    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start_date_time = Some(start.into());
        self
    }

    /// Sets the end bound.
    #[must_use]
    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end_date_time = Some(end.into());
        self
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(
            self.pattern
                .as_deref()
                .is_some_and(|p| CronSchedule::parse(p).is_ok()),
            "pattern",
        );
        let zone = self.zone_id.as_deref().map(parse_time_zone);
        errors.check(matches!(zone, Some(Ok(_))), "zoneId");

        // Bounds are checked for shape even when the zone is wrong
        let tz = match zone {
            Some(Ok(tz)) => tz,
            _ => Tz::UTC,
        };
        let start = self
            .start_date_time
            .as_deref()
            .map(|s| parse_date_time_bound(s, tz));
        let end = self
            .end_date_time
            .as_deref()
            .map(|s| parse_date_time_bound(s, tz));
        errors.check(!matches!(start, Some(Err(_))), "startDateTime");
        errors.check(!matches!(end, Some(Err(_))), "endDateTime");
        if let (Some(Ok(start)), Some(Ok(end))) = (start, end) {
            if end <= start {
                errors.check(false, "startDateTime");
                errors.check(false, "endDateTime");
            }
        }
        errors
    }
}

/// Solar event a sun events trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SunEvent {
    /// Sunrise.
    Sunrise,
    /// Sunset.
    Sunset,
    /// Start of the evening golden hour.
    GoldenHour,
}

impl FromStr for SunEvent {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunrise" => Ok(Self::Sunrise),
            "sunset" => Ok(Self::Sunset),
            "goldenhour" => Ok(Self::GoldenHour),
            _ => Err(ValueError::invalid_state("sun event", s)),
        }
    }
}

impl fmt::Display for SunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sunrise => "sunrise",
            Self::Sunset => "sunset",
            Self::GoldenHour => "golden hour",
        };
        f.write_str(label)
    }
}

/// Sun events trigger settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunEventsTriggerConfig {
    /// `sunrise`, `sunset` or `goldenhour`.
    #[serde(default)]
    pub event: Option<String>,
    /// Decimal latitude.
    #[serde(default)]
    pub latitude: Option<String>,
    /// Decimal longitude.
    #[serde(default)]
    pub longitude: Option<String>,
    /// IANA time zone of the daily refresh.
    #[serde(default)]
    pub zone_id: Option<String>,
    /// Never arm the trigger.
    #[serde(default)]
    pub is_disabled: bool,
}

impl SunEventsTriggerConfig {
    /// Creates an enabled sun events trigger configuration.
    #[must_use]
    pub fn new(
        event: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        Self {
            event: Some(event.into()),
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            zone_id: Some(zone_id.into()),
            is_disabled: false,
        }
    }

    /// Returns the parsed event, if valid.
    #[must_use]
    pub fn sun_event(&self) -> Option<SunEvent> {
        self.event.as_deref().and_then(|e| e.parse().ok())
    }

    pub(crate) fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.check(self.sun_event().is_some(), "event");
        errors.check(
            self.latitude.as_deref().is_some_and(|l| LATITUDE.is_match(l)),
            "latitude",
        );
        errors.check(
            self.longitude
                .as_deref()
                .is_some_and(|l| LONGITUDE.is_match(l)),
            "longitude",
        );
        errors.check(
            self.zone_id
                .as_deref()
                .is_some_and(|z| parse_time_zone(z).is_ok()),
            "zoneId",
        );
        errors
    }
}
