// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reachability trigger.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::accessory::VirtualSensor;
use crate::types::SensorState;

use super::{Probe, TriggerTask, push_state};

/// Time between probes. The first probe runs one interval after arming.
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Counts consecutive probe failures against a threshold.
///
/// # Examples
///
/// ```
/// use virtual_accessories::trigger::FailureCounter;
/// use virtual_accessories::types::SensorState;
///
/// let mut counter = FailureCounter::new(2);
/// assert_eq!(counter.record(false), None);
/// assert_eq!(counter.record(false), Some(SensorState::Triggered));
/// assert_eq!(counter.record(false), None);
/// assert_eq!(counter.record(true), Some(SensorState::Normal));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureCounter {
    failures: u32,
    threshold: u32,
}

impl FailureCounter {
    /// Creates a counter. A zero threshold is treated as 1.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            failures: 0,
            threshold: threshold.max(1),
        }
    }

    /// Current run of consecutive failures.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Records a probe outcome and returns the state to push, if any.
    ///
    /// Every success resets the run and yields `Normal`. A failure yields
    /// `Triggered` only on the probe that reaches the threshold.
    pub fn record(&mut self, success: bool) -> Option<SensorState> {
        if success {
            self.failures = 0;
            return Some(SensorState::Normal);
        }
        self.failures = self.failures.saturating_add(1);
        (self.failures == self.threshold).then_some(SensorState::Triggered)
    }
}

/// Probes a host every [`PING_INTERVAL`] and reflects its reachability in
/// the sensor.
#[derive(Debug)]
pub struct PingTrigger {
    host: String,
    task: TriggerTask,
}

impl PingTrigger {
    /// Starts the probe loop.
    pub(crate) fn spawn<P: Probe>(
        sensor: Weak<VirtualSensor>,
        accessory_id: String,
        name: &str,
        host: String,
        threshold: u32,
        probe: P,
    ) -> Self {
        Self::spawn_with_interval(sensor, accessory_id, name, host, threshold, probe, PING_INTERVAL)
    }

    pub(crate) fn spawn_with_interval<P: Probe>(
        sensor: Weak<VirtualSensor>,
        accessory_id: String,
        name: &str,
        host: String,
        threshold: u32,
        probe: P,
        period: Duration,
    ) -> Self {
        tracing::info!(accessory = %name, host = %host, threshold, "Ping trigger armed");

        let name = name.to_string();
        let task_host = host.clone();
        let task = TriggerTask::spawn(async move {
            let mut counter = FailureCounter::new(threshold);
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let success = match probe.probe().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            accessory = %name,
                            host = %task_host,
                            failures = counter.failures() + 1,
                            error = %e,
                            "Ping failed"
                        );
                        false
                    }
                };
                if let Some(state) = counter.record(success) {
                    if !push_state(&sensor, &accessory_id, state, false) {
                        break;
                    }
                }
            }
        });

        Self { host, task }
    }

    /// Returns the probed host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns `true` while the probe loop runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Stops probing.
    pub fn stop(&self) {
        self.task.stop();
    }
}
