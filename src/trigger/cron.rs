// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cron schedule trigger.

use std::sync::{Arc, Weak};

use chrono::DateTime;
use chrono_tz::Tz;

use crate::accessory::VirtualSensor;
use crate::config::CronTriggerConfig;
use crate::error::ScheduleError;
use crate::schedule::{Clock, CronSchedule, parse_date_time_bound, parse_time_zone, sleep_until};

use super::{TriggerTask, pulse};

/// What a cron tick does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// The tick is before the window opens.
    Skip,
    /// Pulse the sensor.
    Pulse,
    /// The window has closed; stop the schedule.
    Stop,
}

/// Optional start and end bounds of a cron trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CronWindow {
    start: Option<DateTime<Tz>>,
    end: Option<DateTime<Tz>>,
}

impl CronWindow {
    /// Creates a window. Either bound may be open.
    #[must_use]
    pub fn new(start: Option<DateTime<Tz>>, end: Option<DateTime<Tz>>) -> Self {
        Self { start, end }
    }

    /// Returns `true` once `at` is past the end bound.
    #[must_use]
    pub fn has_ended(&self, at: &DateTime<Tz>) -> bool {
        self.end.is_some_and(|end| *at > end)
    }

    /// Decides what the tick at `at` does.
    #[must_use]
    pub fn on_tick(&self, at: &DateTime<Tz>) -> TickAction {
        if self.has_ended(at) {
            TickAction::Stop
        } else if self.start.is_some_and(|start| *at < start) {
            TickAction::Skip
        } else {
            TickAction::Pulse
        }
    }
}

/// Pulses a sensor on every match of a cron pattern inside a window.
#[derive(Debug)]
pub struct CronTrigger {
    schedule: CronSchedule,
    task: TriggerTask,
}

struct Plan {
    schedule: CronSchedule,
    zone: Tz,
    window: CronWindow,
}

fn plan(config: &CronTriggerConfig) -> Result<Plan, ScheduleError> {
    let schedule = CronSchedule::parse(config.pattern.as_deref().unwrap_or_default())?;
    let zone = parse_time_zone(config.zone_id.as_deref().unwrap_or_default())?;
    let start = config
        .start_date_time
        .as_deref()
        .map(|s| parse_date_time_bound(s, zone))
        .transpose()?;
    let end = config
        .end_date_time
        .as_deref()
        .map(|s| parse_date_time_bound(s, zone))
        .transpose()?;
    Ok(Plan {
        schedule,
        zone,
        window: CronWindow::new(start, end),
    })
}

impl CronTrigger {
    /// Arms the schedule.
    ///
    /// Returns `None` if the configuration cannot be parsed or the window
    /// has already closed.
    pub(crate) fn spawn(
        sensor: Weak<VirtualSensor>,
        accessory_id: String,
        name: &str,
        config: &CronTriggerConfig,
        clock: Arc<dyn Clock>,
    ) -> Option<Self> {
        let Plan {
            schedule,
            zone,
            window,
        } = match plan(config) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(accessory = %name, error = %e, "Invalid cron trigger");
                return None;
            }
        };

        if window.has_ended(&clock.now().with_timezone(&zone)) {
            tracing::info!(accessory = %name, "Cron window already ended, not scheduling");
            return None;
        }

        tracing::info!(accessory = %name, pattern = %schedule, zone = %zone, "Cron trigger armed");
        let quiet = config.disable_trigger_event_logging;
        let name = name.to_string();
        let task_schedule = schedule.clone();

        let task = TriggerTask::spawn(async move {
            let mut started = false;
            loop {
                let now = clock.now().with_timezone(&zone);
                let Some(next) = task_schedule.next_after(&now) else {
                    tracing::info!(accessory = %name, "Cron pattern has no further matches");
                    break;
                };

                sleep_until(clock.as_ref(), &next).await;

                match window.on_tick(&next) {
                    TickAction::Skip => {
                        tracing::debug!(accessory = %name, tick = %next, "Cron tick before start, skipped");
                    }
                    TickAction::Stop => {
                        tracing::info!(accessory = %name, "Cron window ended, stopping");
                        break;
                    }
                    TickAction::Pulse => {
                        if !started {
                            tracing::info!(accessory = %name, "Starting cron job");
                            started = true;
                        }
                        if !quiet {
                            tracing::info!(accessory = %name, tick = %next, "Cron job fired");
                        }
                        if !pulse(&sensor, &accessory_id, quiet).await {
                            break;
                        }
                    }
                }
            }
        });

        Some(Self { schedule, task })
    }

    /// Returns the schedule.
    #[must_use]
    pub fn schedule(&self) -> &CronSchedule {
        &self.schedule
    }

    /// Returns `true` while the schedule is armed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Cancels the schedule.
    pub fn stop(&self) {
        self.task.stop();
    }
}
