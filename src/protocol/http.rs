// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the public sunrise/sunset data service.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SunEvent;
use crate::error::{ProtocolError, ScheduleError};
use crate::schedule::{parse_clock_time, parse_time_zone};

use super::RetryPolicy;

/// Base URL of the public sunrise/sunset API.
pub const DEFAULT_SUN_EVENTS_URL: &str = "https://api.sunrisesunset.io";

/// `status` value of a successful response.
const STATUS_OK: &str = "OK";

// ============================================================================
// Response model
// ============================================================================

/// Solar times for one day at one location.
///
/// Times are 12-hour clock strings (`7:22:10 PM`) local to
/// [`timezone`](Self::timezone). Events that do not occur on the day, as
/// in polar summer, are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunData {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Sunrise.
    #[serde(default)]
    pub sunrise: Option<String>,
    /// Sunset.
    #[serde(default)]
    pub sunset: Option<String>,
    /// Start of astronomical twilight.
    #[serde(default)]
    pub first_light: Option<String>,
    /// End of astronomical twilight.
    #[serde(default)]
    pub last_light: Option<String>,
    /// Civil dawn.
    #[serde(default)]
    pub dawn: Option<String>,
    /// Civil dusk.
    #[serde(default)]
    pub dusk: Option<String>,
    /// Solar noon.
    #[serde(default)]
    pub solar_noon: Option<String>,
    /// Start of the evening golden hour.
    #[serde(default)]
    pub golden_hour: Option<String>,
    /// Day length, `H:MM:SS`.
    #[serde(default)]
    pub day_length: Option<String>,
    /// IANA zone the times are expressed in.
    pub timezone: String,
    /// Offset from UTC in minutes.
    #[serde(default)]
    pub utc_offset: Option<i64>,
}

impl SunData {
    /// Returns the clock string of `event`.
    #[must_use]
    pub fn event_time(&self, event: SunEvent) -> Option<&str> {
        match event {
            SunEvent::Sunrise => self.sunrise.as_deref(),
            SunEvent::Sunset => self.sunset.as_deref(),
            SunEvent::GoldenHour => self.golden_hour.as_deref(),
        }
    }

    /// Resolves `event` to an instant in the response's zone.
    ///
    /// # Errors
    ///
    /// Returns a [`ScheduleError`] if the event is missing, or the date,
    /// clock time or zone cannot be parsed.
    pub fn event_instant(&self, event: SunEvent) -> Result<DateTime<Tz>, ScheduleError> {
        let clock = self
            .event_time(event)
            .ok_or_else(|| ScheduleError::InvalidClockTime(format!("no {event} on {}", self.date)))?;
        let time = parse_clock_time(clock)?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| ScheduleError::InvalidDateTime(self.date.clone()))?;
        let zone = parse_time_zone(&self.timezone)?;
        zone.from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or_else(|| ScheduleError::InvalidDateTime(format!("{} {clock}", self.date)))
    }
}

#[derive(Debug, Deserialize)]
struct SunEventsResponse {
    status: String,
    #[serde(default, alias = "dailyDetails")]
    results: Option<SunData>,
}

// ============================================================================
// SunEventsClient
// ============================================================================

/// Fetches [`SunData`] over HTTP.
///
/// Transport failures and non-success statuses are retried according to
/// a [`RetryPolicy`] (5 attempts, linear backoff by default). A response
/// whose `status` is not `OK` is not retried.
///
/// # Examples
///
/// ```no_run
/// use virtual_accessories::protocol::SunEventsClient;
///
/// # async fn example() -> Result<(), virtual_accessories::error::ProtocolError> {
/// let client = SunEventsClient::new()?;
/// let today = client.fetch("48.8566", "2.3522").await?;
/// println!("sunset at {:?}", today.sunset);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SunEventsClient {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl SunEventsClient {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a client for the public service.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, ProtocolError> {
        Self::with_base_url(DEFAULT_SUN_EVENTS_URL)
    }

    /// Creates a client for another deployment of the same API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, latitude: &str, longitude: &str) -> String {
        format!(
            "{}/json?lat={}&lng={}",
            self.base_url,
            urlencoding::encode(latitude),
            urlencoding::encode(longitude)
        )
    }

    /// Fetches today's solar times for a location.
    ///
    /// # Errors
    ///
    /// Returns the last transport or status error once retries are
    /// exhausted, or [`ProtocolError::UnexpectedResponse`] for a payload
    /// that is not a successful sun data document.
    pub async fn fetch(&self, latitude: &str, longitude: &str) -> Result<SunData, ProtocolError> {
        let url = self.build_url(latitude, longitude);
        let mut attempt = 1;
        loop {
            match self.fetch_once(&url).await {
                Ok(data) => return Ok(data),
                Err(e @ ProtocolError::UnexpectedResponse(_)) => return Err(e),
                Err(e) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Sun data request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<SunData, ProtocolError> {
        tracing::debug!(url = %url, "Requesting sun data");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        if !response.status().is_success() {
            return Err(ProtocolError::HttpStatus(response.status().as_u16()));
        }

        let body = response.text().await.map_err(ProtocolError::Http)?;
        tracing::debug!(body = %body, "Received sun data");

        let parsed: SunEventsResponse = serde_json::from_str(&body)
            .map_err(|e| ProtocolError::UnexpectedResponse(e.to_string()))?;
        if parsed.status != STATUS_OK {
            return Err(ProtocolError::UnexpectedResponse(format!(
                "status {}",
                parsed.status
            )));
        }
        parsed
            .results
            .ok_or_else(|| ProtocolError::UnexpectedResponse("missing results".to_string()))
    }
}
