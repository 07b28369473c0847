// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Five-field cron patterns.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::error::ScheduleError;

/// How far ahead `next_after` searches before giving up.
const SEARCH_DAYS: u32 = 366 * 5;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    name_offset: u32,
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59, names: &[], name_offset: 0 };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23, names: &[], name_offset: 0 };
const DAY_OF_MONTH: FieldSpec =
    FieldSpec { name: "day of month", min: 1, max: 31, names: &[], name_offset: 0 };
const MONTH: FieldSpec =
    FieldSpec { name: "month", min: 1, max: 12, names: &MONTH_NAMES, name_offset: 1 };
const DAY_OF_WEEK: FieldSpec =
    FieldSpec { name: "day of week", min: 0, max: 7, names: &DAY_NAMES, name_offset: 0 };

/// A parsed minute-granularity cron pattern.
///
/// Fields are minute, hour, day of month, month (`1-12` or `JAN-DEC`) and
/// day of week (`0-7` or `SUN-SAT`, where both 0 and 7 are Sunday). Each
/// field accepts `*`, `?`, lists, ranges and steps. The `L` and `#`
/// extensions are rejected. When both day fields are restricted a date
/// matches if either of them does.
///
/// # Examples
///
/// ```
/// use chrono::TimeZone;
/// use chrono_tz::Tz;
/// use virtual_accessories::schedule::CronSchedule;
///
/// let schedule = CronSchedule::parse("30 7 * * MON-FRI").unwrap();
/// let friday = Tz::UTC.with_ymd_and_hms(2030, 1, 4, 8, 0, 0).unwrap();
/// let next = schedule.next_after(&friday).unwrap();
/// assert_eq!(next, Tz::UTC.with_ymd_and_hms(2030, 1, 7, 7, 30, 0).unwrap());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CronSchedule {
    pattern: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    day_of_month_restricted: bool,
    day_of_week_restricted: bool,
}

impl CronSchedule {
    /// Parses a five-field pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidCronPattern`] describing the first
    /// problem found.
    pub fn parse(pattern: &str) -> Result<Self, ScheduleError> {
        let invalid = |reason: String| ScheduleError::InvalidCronPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let fields: Vec<&str> = pattern.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
        }

        let minutes = parse_field(fields[0], MINUTE).map_err(invalid)?;
        let hours = parse_field(fields[1], HOUR).map_err(invalid)?;
        let days_of_month = parse_field(fields[2], DAY_OF_MONTH).map_err(invalid)?;
        let months = parse_field(fields[3], MONTH).map_err(invalid)?;
        let mut days_of_week = parse_field(fields[4], DAY_OF_WEEK).map_err(invalid)?;

        // Sunday may be written as 7
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            pattern: pattern.to_string(),
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
            day_of_month_restricted: is_restricted(fields[2]),
            day_of_week_restricted: is_restricted(fields[4]),
        })
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns `true` if the pattern fires at the minute containing `at`.
    #[must_use]
    pub fn matches<Z: TimeZone>(&self, at: &DateTime<Z>) -> bool {
        let local = at.naive_local();
        self.matches_date(local.date())
            && bit(self.hours, local.hour())
            && bit(self.minutes, local.minute())
    }

    /// Returns the first firing strictly after `after`, in the same zone.
    ///
    /// Local times skipped by a DST transition never fire. Local times
    /// repeated by a DST transition fire once, on their first occurrence.
    /// Returns `None` if nothing fires within the next five years.
    #[must_use]
    pub fn next_after(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let zone = after.timezone();
        let start = after.naive_local().with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);

        let mut date = start.date();
        for day in 0..SEARCH_DAYS {
            if self.matches_date(date) {
                let (from_hour, from_minute) = if day == 0 {
                    (start.hour(), start.minute())
                } else {
                    (0, 0)
                };
                for hour in from_hour..24 {
                    if !bit(self.hours, hour) {
                        continue;
                    }
                    let first_minute = if hour == from_hour { from_minute } else { 0 };
                    for minute in first_minute..60 {
                        if !bit(self.minutes, minute) {
                            continue;
                        }
                        let naive = date.and_hms_opt(hour, minute, 0)?;
                        if let Some(candidate) = zone.from_local_datetime(&naive).earliest() {
                            if candidate > *after {
                                return Some(candidate);
                            }
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }
        None
    }

    fn matches_date(&self, date: NaiveDate) -> bool {
        if !bit(self.months, date.month()) {
            return false;
        }
        let dom = bit(self.days_of_month, date.day());
        let dow = bit(self.days_of_week, date.weekday().num_days_from_sunday());
        if self.day_of_month_restricted && self.day_of_week_restricted {
            dom || dow
        } else {
            dom && dow
        }
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.pattern).finish()
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn bit(mask: u64, value: u32) -> bool {
    mask & (1 << value) != 0
}

fn is_restricted(field: &str) -> bool {
    !(field.starts_with('*') || field == "?")
}

fn parse_field(field: &str, spec: FieldSpec) -> Result<u64, String> {
    if field == "?" {
        return Ok(range_mask(spec.min, spec.max, 1));
    }
    let mut mask = 0;
    for item in field.split(',') {
        mask |= parse_item(item, spec)?;
    }
    Ok(mask)
}

fn parse_item(item: &str, spec: FieldSpec) -> Result<u64, String> {
    if item.contains('#') {
        return Err(format!("'#' is not supported in {} field", spec.name));
    }

    let (range, step) = match item.split_once('/') {
        Some((range, step)) => {
            let step: u32 = step
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| format!("invalid step '{step}' in {} field", spec.name))?;
            (range, Some(step))
        }
        None => (item, None),
    };

    let (low, high) = if range == "*" {
        (spec.min, spec.max)
    } else if let Some((low, high)) = range.split_once('-') {
        (parse_value(low, spec)?, parse_value(high, spec)?)
    } else {
        let value = parse_value(range, spec)?;
        // `5/15` runs from 5 to the end of the field
        (value, if step.is_some() { spec.max } else { value })
    };

    if low > high {
        return Err(format!("range {low}-{high} is reversed in {} field", spec.name));
    }
    Ok(range_mask(low, high, step.unwrap_or(1)))
}

fn parse_value(token: &str, spec: FieldSpec) -> Result<u32, String> {
    let value = if let Ok(value) = token.parse::<u32>() {
        value
    } else if let Some(index) = spec
        .names
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
    {
        u32::try_from(index).map_err(|e| e.to_string())? + spec.name_offset
    } else if token.eq_ignore_ascii_case("L") || token.to_ascii_uppercase().ends_with('L') {
        return Err(format!("'L' is not supported in {} field", spec.name));
    } else {
        return Err(format!("invalid value '{token}' in {} field", spec.name));
    };

    if (spec.min..=spec.max).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{value} is out of range {}-{} in {} field",
            spec.min, spec.max, spec.name
        ))
    }
}

fn range_mask(low: u32, high: u32, step: u32) -> u64 {
    (low..=high)
        .step_by(step as usize)
        .fold(0, |mask, value| mask | (1 << value))
}
