// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ICMP echo prober.

use std::net::IpAddr;
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};

use crate::error::ProtocolError;
use crate::trigger::Probe;

const PAYLOAD: [u8; 56] = [0; 56];

/// Sends ICMP echo requests to one host.
///
/// The address family follows the configured host. Names that are not IP
/// literals are resolved through the system resolver on every probe.
/// Opening the ICMP socket needs either raw socket privileges or, on
/// Linux, a `net.ipv4.ping_group_range` that covers the process.
#[derive(Debug, Clone)]
pub struct IcmpProber {
    host: String,
    timeout: Duration,
    attempts: u16,
}

impl IcmpProber {
    /// Default echo timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    /// Creates a prober with a 20 s timeout and one retry.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            attempts: 2,
        }
    }

    /// Sets the echo timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many echoes are tried before a probe fails.
    #[must_use]
    pub fn with_attempts(mut self, attempts: u16) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Returns the configured host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    async fn resolve(&self) -> Result<IpAddr, ProtocolError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(ip);
        }
        let mut addresses = tokio::net::lookup_host((self.host.as_str(), 0))
            .await
            .map_err(|e| ProtocolError::Resolve(format!("{}: {e}", self.host)))?;
        addresses
            .next()
            .map(|address| address.ip())
            .ok_or_else(|| ProtocolError::Resolve(self.host.clone()))
    }
}

impl Probe for IcmpProber {
    async fn probe(&self) -> Result<(), ProtocolError> {
        let ip = self.resolve().await?;
        let config = match ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config).map_err(|e| ProtocolError::Ping(e.to_string()))?;
        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        let mut last_error = None;
        for sequence in 0..self.attempts {
            match pinger.ping(PingSequence(sequence), &PAYLOAD).await {
                Ok((_, rtt)) => {
                    tracing::debug!(host = %self.host, %ip, rtt = ?rtt, "Ping reply");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(host = %self.host, %ip, error = %e, "Ping attempt failed");
                    last_error = Some(match e {
                        SurgeError::Timeout { .. } => ProtocolError::Timeout(
                            u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                        ),
                        other => ProtocolError::Ping(other.to_string()),
                    });
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ProtocolError::Ping("no attempt made".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn literal_addresses_skip_resolution() {
        let prober = IcmpProber::new("::1");
        assert_eq!(prober.resolve().await.unwrap(), "::1".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn unresolvable_names_fail() {
        let prober = IcmpProber::new("host.invalid");
        assert!(matches!(prober.resolve().await, Err(ProtocolError::Resolve(_))));
    }

    #[test]
    fn at_least_one_attempt() {
        assert_eq!(IcmpProber::new("10.0.0.1").with_attempts(0).attempts, 1);
    }
}
