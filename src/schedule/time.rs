// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time zone, date-time bound and clock-time parsing.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::ScheduleError;

static DATE_TIME_BOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-[01]\d-[0-3]\dT[0-2]\d:[0-5]\d:[0-5]\d(Z|[+-][0-2]\d:[0-5]\d)?$")
        .expect("date-time pattern is valid")
});

/// Parses an IANA time zone identifier such as `Europe/Paris`.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTimeZone`] for unknown identifiers.
pub fn parse_time_zone(zone: &str) -> Result<Tz, ScheduleError> {
    zone.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimeZone(zone.to_string()))
}

/// Parses a trigger window bound in `zone`.
///
/// The accepted shape is `YYYY-MM-DDTHH:MM:SS` followed by nothing, `Z`,
/// or an explicit `+HH:MM`/`-HH:MM` offset. Without an offset, and with a
/// trailing `Z`, the value is a local time in `zone`. An explicit offset
/// is honoured as written.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidDateTime`] when the shape is wrong, the
/// date does not exist, or the local time falls in a DST gap.
pub fn parse_date_time_bound(value: &str, zone: Tz) -> Result<DateTime<Tz>, ScheduleError> {
    let invalid = || ScheduleError::InvalidDateTime(value.to_string());
    if !DATE_TIME_BOUND.is_match(value) {
        return Err(invalid());
    }

    let (local, offset) = value.split_at(19);
    if offset.is_empty() || offset == "Z" {
        let naive =
            NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S").map_err(|_| invalid())?;
        zone.from_local_datetime(&naive).earliest().ok_or_else(invalid)
    } else {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&zone))
            .map_err(|_| invalid())
    }
}

/// Parses a 12-hour clock string such as `7:22:10 PM` or `12:05 AM`.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidClockTime`] when the string is not a
/// valid 12-hour time.
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidClockTime(value.to_string());

    let mut parts = value.split_whitespace();
    let (Some(clock), Some(meridiem), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let mut fields = clock.split(':').map(str::parse::<u32>);
    let hour = fields.next().and_then(Result::ok).ok_or_else(invalid)?;
    let minute = fields.next().and_then(Result::ok).ok_or_else(invalid)?;
    let second = match fields.next() {
        Some(second) => second.map_err(|_| invalid())?,
        None => 0,
    };
    if fields.next().is_some() || !(1..=12).contains(&hour) {
        return Err(invalid());
    }

    let hour = match meridiem.to_ascii_uppercase().as_str() {
        "AM" => hour % 12,
        "PM" => hour % 12 + 12,
        _ => return Err(invalid()),
    };
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use chrono::{Timelike, Utc};

    use super::*;

    #[test]
    fn time_zones() {
        assert_eq!(parse_time_zone("Europe/Paris").unwrap(), Tz::Europe__Paris);
        assert_eq!(parse_time_zone("UTC").unwrap(), Tz::UTC);
        assert!(parse_time_zone("Europe/Atlantis").is_err());
        assert!(parse_time_zone("").is_err());
    }

    #[test]
    fn bound_without_offset_is_local() {
        let bound = parse_date_time_bound("2030-07-01T08:00:00", Tz::Europe__Paris).unwrap();
        assert_eq!(
            bound.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2030, 7, 1, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn trailing_z_is_local_too() {
        let z = parse_date_time_bound("2030-07-01T08:00:00Z", Tz::Europe__Paris).unwrap();
        let bare = parse_date_time_bound("2030-07-01T08:00:00", Tz::Europe__Paris).unwrap();
        assert_eq!(z, bare);
    }

    #[test]
    fn explicit_offset_is_honoured() {
        let bound = parse_date_time_bound("2030-07-01T08:00:00+00:00", Tz::Europe__Paris).unwrap();
        assert_eq!(bound.hour(), 10);
    }

    #[test]
    fn malformed_bounds() {
        for bad in [
            "2030-07-01",
            "2030-07-01 08:00:00",
            "2030-07-01T08:00",
            "2030-13-01T08:00:00",
            "2030-02-30T08:00:00",
            "2030-07-01T08:00:00+0200",
        ] {
            assert!(parse_date_time_bound(bad, Tz::UTC).is_err(), "{bad}");
        }
    }

    #[test]
    fn bound_in_dst_gap_is_rejected() {
        assert!(parse_date_time_bound("2030-03-31T02:30:00", Tz::Europe__Paris).is_err());
    }

    #[test]
    fn clock_times() {
        let t = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
        assert_eq!(parse_clock_time("7:22:10 PM").unwrap(), t(19, 22, 10));
        assert_eq!(parse_clock_time("6:01:03 AM").unwrap(), t(6, 1, 3));
        assert_eq!(parse_clock_time("12:00:00 PM").unwrap(), t(12, 0, 0));
        assert_eq!(parse_clock_time("12:30:00 AM").unwrap(), t(0, 30, 0));
        assert_eq!(parse_clock_time("11:59 pm").unwrap(), t(23, 59, 0));
    }

    #[test]
    fn bad_clock_times() {
        for bad in ["19:22:10", "13:00:00 PM", "0:10:00 AM", "7:61:00 AM", "7:00:00 XM", ""] {
            assert!(parse_clock_time(bad).is_err(), "{bad}");
        }
    }
}
