// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Autonomous sensor triggers.
//!
//! A sensor accessory may be driven by one trigger:
//!
//! - [`PingTrigger`]: flips the sensor after consecutive failed echo probes
//! - [`CronTrigger`]: pulses the sensor on every match of a cron pattern
//! - [`SunEventsTrigger`]: pulses the sensor at sunrise, sunset or golden hour
//!
//! Each trigger runs as one tokio task that holds only a weak reference to
//! its sensor and stops when the sensor is gone, when
//! [`Trigger::stop`] is called, or when the trigger is dropped.
//!
//! A trigger identifies itself to the sensor by the `accessoryID` it was
//! configured with; the sensor rejects a trigger built for another
//! accessory.

mod cron;
#[cfg(feature = "ping")]
mod ping;
#[cfg(feature = "sunevents")]
mod sun_events;

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::accessory::VirtualSensor;
use crate::config::{AccessoryConfig, TriggerKind};
use crate::error::ProtocolError;
use crate::schedule::{Clock, SystemClock};
use crate::types::SensorState;

pub use cron::{CronTrigger, CronWindow, TickAction};
#[cfg(feature = "ping")]
pub use ping::{FailureCounter, PING_INTERVAL, PingTrigger};
#[cfg(feature = "sunevents")]
pub use sun_events::{SunDataSource, SunEventsTrigger};

/// How long a pulse holds the sensor `Triggered`.
pub const PULSE_SETTLE: Duration = Duration::from_secs(3);

/// A reachability check.
pub trait Probe: Send + Sync + 'static {
    /// Returns `Ok` if the target answered.
    fn probe(&self) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}

/// Shared inputs for building triggers.
#[derive(Debug, Clone)]
pub struct TriggerEnvironment {
    clock: Arc<dyn Clock>,
    sun_events_url: String,
}

impl TriggerEnvironment {
    /// Creates an environment using the system clock and the public sun
    /// data service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the clock calendar triggers read.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the base URL of the sun data service.
    #[must_use]
    pub fn with_sun_events_url(mut self, url: impl Into<String>) -> Self {
        self.sun_events_url = url.into();
        self
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Returns the sun data base URL.
    #[must_use]
    pub fn sun_events_url(&self) -> &str {
        &self.sun_events_url
    }
}

impl Default for TriggerEnvironment {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            sun_events_url: "https://api.sunrisesunset.io".to_string(),
        }
    }
}

/// The trigger armed for a sensor accessory.
#[derive(Debug)]
pub enum Trigger {
    /// Reachability trigger.
    #[cfg(feature = "ping")]
    Ping(PingTrigger),
    /// Calendar trigger.
    Cron(CronTrigger),
    /// Solar event trigger.
    #[cfg(feature = "sunevents")]
    SunEvents(SunEventsTrigger),
}

impl Trigger {
    /// Arms the trigger selected by `sensorTrigger`.
    ///
    /// Returns `None` when no trigger is configured, when it is disabled,
    /// when its configuration is defective, or when the crate was built
    /// without the feature it needs. Every case but the first is logged.
    pub(crate) fn create(
        sensor: &Arc<VirtualSensor>,
        config: &AccessoryConfig,
        environment: &TriggerEnvironment,
    ) -> Option<Self> {
        let kind = config.trigger_kind()?;
        let name = config.name();
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::error!(accessory = %name, trigger = %kind, "No tokio runtime, trigger not armed");
            return None;
        }
        let accessory_id = config.id().to_string();
        let weak = Arc::downgrade(sensor);

        match kind {
            TriggerKind::Ping => {
                let Some(trigger) = config.ping_trigger.as_ref() else {
                    tracing::error!(accessory = %name, trigger = "ping", "Missing trigger configuration");
                    return None;
                };
                if trigger.is_disabled {
                    tracing::info!(accessory = %name, trigger = "ping", "Trigger is disabled");
                    return None;
                }
                Self::create_ping(weak, accessory_id, name, trigger)
            }
            TriggerKind::Cron => {
                let Some(trigger) = config.cron_trigger.as_ref() else {
                    tracing::error!(accessory = %name, trigger = "cron", "Missing trigger configuration");
                    return None;
                };
                if trigger.is_disabled {
                    tracing::info!(accessory = %name, trigger = "cron", "Trigger is disabled");
                    return None;
                }
                CronTrigger::spawn(weak, accessory_id, name, trigger, environment.clock())
                    .map(Self::Cron)
            }
            TriggerKind::SunEvents => {
                let Some(trigger) = config.sun_events_trigger.as_ref() else {
                    tracing::error!(accessory = %name, trigger = "sunevents", "Missing trigger configuration");
                    return None;
                };
                if trigger.is_disabled {
                    tracing::info!(accessory = %name, trigger = "sunevents", "Trigger is disabled");
                    return None;
                }
                Self::create_sun_events(weak, accessory_id, name, trigger, environment)
            }
        }
    }

    #[cfg(feature = "ping")]
    fn create_ping(
        sensor: Weak<VirtualSensor>,
        accessory_id: String,
        name: &str,
        config: &crate::config::PingTriggerConfig,
    ) -> Option<Self> {
        let Some(host) = config.host.clone().filter(|h| !h.trim().is_empty()) else {
            tracing::error!(accessory = %name, trigger = "ping", "Missing host");
            return None;
        };
        let prober = crate::protocol::IcmpProber::new(host.clone());
        Some(Self::Ping(PingTrigger::spawn(
            sensor,
            accessory_id,
            name,
            host,
            config.failure_threshold(),
            prober,
        )))
    }

    #[cfg(not(feature = "ping"))]
    fn create_ping(
        _sensor: Weak<VirtualSensor>,
        _accessory_id: String,
        name: &str,
        _config: &crate::config::PingTriggerConfig,
    ) -> Option<Self> {
        tracing::error!(accessory = %name, trigger = "ping", "Built without the `ping` feature");
        None
    }

    #[cfg(feature = "sunevents")]
    fn create_sun_events(
        sensor: Weak<VirtualSensor>,
        accessory_id: String,
        name: &str,
        config: &crate::config::SunEventsTriggerConfig,
        environment: &TriggerEnvironment,
    ) -> Option<Self> {
        let client = match crate::protocol::SunEventsClient::with_base_url(environment.sun_events_url()) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(accessory = %name, trigger = "sunevents", error = %e, "Cannot create sun data client");
                return None;
            }
        };
        SunEventsTrigger::spawn(sensor, accessory_id, name, config, client, environment.clock())
            .map(Self::SunEvents)
    }

    #[cfg(not(feature = "sunevents"))]
    fn create_sun_events(
        _sensor: Weak<VirtualSensor>,
        _accessory_id: String,
        name: &str,
        _config: &crate::config::SunEventsTriggerConfig,
        _environment: &TriggerEnvironment,
    ) -> Option<Self> {
        tracing::error!(accessory = %name, trigger = "sunevents", "Built without the `sunevents` feature");
        None
    }

    /// Returns the trigger kind.
    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        match self {
            #[cfg(feature = "ping")]
            Self::Ping(_) => TriggerKind::Ping,
            Self::Cron(_) => TriggerKind::Cron,
            #[cfg(feature = "sunevents")]
            Self::SunEvents(_) => TriggerKind::SunEvents,
        }
    }

    /// Returns `true` while the trigger task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        match self {
            #[cfg(feature = "ping")]
            Self::Ping(t) => t.is_running(),
            Self::Cron(t) => t.is_running(),
            #[cfg(feature = "sunevents")]
            Self::SunEvents(t) => t.is_running(),
        }
    }

    /// Cancels the trigger. Idempotent.
    pub fn stop(&self) {
        match self {
            #[cfg(feature = "ping")]
            Self::Ping(t) => t.stop(),
            Self::Cron(t) => t.stop(),
            #[cfg(feature = "sunevents")]
            Self::SunEvents(t) => t.stop(),
        }
    }
}

// ============================================================================
// Shared task plumbing
// ============================================================================

/// A spawned trigger loop, aborted on drop.
#[derive(Debug)]
pub(crate) struct TriggerTask {
    handle: JoinHandle<()>,
}

impl TriggerTask {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub(crate) fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for TriggerTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Pushes `state` to the sensor on behalf of the trigger.
///
/// Returns `false` once the sensor is gone or has rejected the trigger,
/// which ends the trigger loop.
pub(crate) fn push_state(
    sensor: &Weak<VirtualSensor>,
    accessory_id: &str,
    state: SensorState,
    quiet: bool,
) -> bool {
    let Some(sensor) = sensor.upgrade() else {
        return false;
    };
    match sensor.trigger_key_sensor_state(state, accessory_id, quiet) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(sensor = %sensor.name(), error = %e, "Trigger rejected");
            false
        }
    }
}

/// Holds the sensor `Triggered` for [`PULSE_SETTLE`], then `Normal`.
pub(crate) async fn pulse(sensor: &Weak<VirtualSensor>, accessory_id: &str, quiet: bool) -> bool {
    if !push_state(sensor, accessory_id, SensorState::Triggered, quiet) {
        return false;
    }
    tokio::time::sleep(PULSE_SETTLE).await;
    push_state(sensor, accessory_id, SensorState::Normal, quiet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::AccessoryContext;
    use crate::config::{AccessoryKind, CronTriggerConfig};
    use crate::event::EventBus;
    use crate::types::SensorKind;

    fn sensor(id: &str) -> Arc<VirtualSensor> {
        let config = AccessoryConfig::new(id, "Sensor", AccessoryKind::Sensor);
        let context = AccessoryContext::new(config, None, EventBus::new());
        Arc::new(VirtualSensor::standalone(&context, SensorKind::Contact))
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_returns_to_normal() {
        let sensor = sensor("s");
        let weak = Arc::downgrade(&sensor);
        let task = tokio::spawn(async move { pulse(&weak, "s", true).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sensor.state(), SensorState::Triggered);
        assert!(task.await.unwrap());
        assert_eq!(sensor.state(), SensorState::Normal);
    }

    #[tokio::test]
    async fn pulse_from_foreign_trigger_is_refused() {
        let sensor = sensor("s");
        assert!(!pulse(&Arc::downgrade(&sensor), "other", false).await);
        assert_eq!(sensor.state(), SensorState::Normal);
    }

    #[tokio::test]
    async fn disabled_trigger_is_not_armed() {
        let sensor = sensor("s");
        let config = AccessoryConfig {
            sensor_trigger: Some("cron".into()),
            cron_trigger: Some(CronTriggerConfig {
                is_disabled: true,
                ..CronTriggerConfig::new("* * * * *", "UTC")
            }),
            ..AccessoryConfig::new("s", "Sensor", AccessoryKind::Sensor)
        };
        assert!(Trigger::create(&sensor, &config, &TriggerEnvironment::default()).is_none());
    }

    #[test]
    fn trigger_outside_runtime_is_not_armed() {
        let sensor = sensor("s");
        let config = AccessoryConfig {
            sensor_trigger: Some("cron".into()),
            cron_trigger: Some(CronTriggerConfig::new("* * * * *", "UTC")),
            ..AccessoryConfig::new("s", "Sensor", AccessoryKind::Sensor)
        };
        assert!(Trigger::create(&sensor, &config, &TriggerEnvironment::default()).is_none());
    }
}
