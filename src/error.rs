// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the virtual accessories library.
//!
//! The hierarchy separates configuration defects (reported once, at
//! construction), ownership violations (wiring bugs that must reach the
//! caller), transient network failures, persistence failures and
//! scheduling defects.

use thiserror::Error;

use crate::characteristic::Characteristic;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A value failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The accessory configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A companion or trigger acted outside of its bound accessory.
    #[error("ownership error: {0}")]
    Ownership(#[from] OwnershipError),

    /// A network operation failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Reading or writing persisted state failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A schedule could not be built.
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// No accessory is registered under the requested identifier.
    #[error("accessory not found")]
    AccessoryNotFound,

    /// The accessory does not expose the requested characteristic.
    #[error("characteristic {0} is not supported by this service")]
    UnsupportedCharacteristic(Characteristic),

    /// The host supplied a value of the wrong shape for a characteristic.
    #[error("invalid value for {characteristic}: {message}")]
    InvalidValue {
        /// The characteristic being written.
        characteristic: Characteristic,
        /// Description of the mismatch.
        message: String,
    },
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// A state name or number does not map to a known variant.
    #[error("invalid {kind}: {value}")]
    InvalidState {
        /// The kind of state being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

impl ValueError {
    pub(crate) fn invalid_state(kind: &'static str, value: impl ToString) -> Self {
        Self::InvalidState {
            kind,
            value: value.to_string(),
        }
    }
}

/// Errors raised while parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more fields failed validation.
    #[error("invalid accessory {accessory}: {}", fields.join(", "))]
    InvalidFields {
        /// Name (or identifier) of the offending accessory.
        accessory: String,
        /// Every field that failed validation, in discovery order.
        fields: Vec<String>,
    },

    /// The accessory type string is not recognised.
    #[error("unknown accessory type: {0}")]
    UnknownAccessoryType(String),

    /// The sensor type string is not recognised.
    #[error("unknown sensor type: {0}")]
    UnknownSensorType(String),

    /// The trigger type string is not recognised.
    #[error("unknown trigger type: {0}")]
    UnknownTriggerType(String),

    /// The configuration document is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Contract violations between accessories, companions and triggers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    /// The sensor is not a companion of any accessory.
    #[error("sensor {sensor} is not a companion sensor")]
    NotCompanion {
        /// Name of the sensor.
        sensor: String,
    },

    /// An accessory other than the owner tried to drive a companion.
    #[error("accessory {caller} is not allowed to trigger {sensor}")]
    AccessoryNotAllowed {
        /// Identifier of the calling accessory.
        caller: String,
        /// Name of the targeted companion.
        sensor: String,
    },

    /// A trigger tried to drive a sensor it was not built for.
    #[error("trigger for {trigger} is not allowed to trigger {sensor}")]
    TriggerNotAllowed {
        /// Accessory identifier the trigger was constructed against.
        trigger: String,
        /// Name of the targeted sensor.
        sensor: String,
    },
}

/// Errors related to network communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "sunevents")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The payload could not be interpreted.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The host name did not resolve to any address.
    #[error("could not resolve {0}")]
    Resolve(String),

    /// The echo probe failed.
    #[error("ping failed: {0}")]
    Ping(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),
}

/// Errors raised by the per-accessory state file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file could not be read, written or removed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file content is not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building schedules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The cron pattern could not be parsed.
    #[error("invalid cron pattern '{pattern}': {reason}")]
    InvalidCronPattern {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The time zone is not a known IANA identifier.
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),

    /// A date-time bound is malformed.
    #[error("invalid date-time: {0}")]
    InvalidDateTime(String),

    /// A 12-hour clock string is malformed.
    #[error("invalid clock time: {0}")]
    InvalidClockTime(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
