// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solar event trigger.
//!
//! Once a day, one minute past local midnight in the configured zone, the
//! trigger fetches the day's solar times and schedules a single pulse at
//! the configured event. Events that have already passed are skipped
//! until the next refresh. The first fetch happens when the trigger is
//! armed.

use std::future::Future;
use std::sync::{Arc, Weak};

use chrono::Utc;
use chrono_tz::Tz;

use crate::accessory::VirtualSensor;
use crate::config::{SunEvent, SunEventsTriggerConfig};
use crate::error::ProtocolError;
use crate::protocol::{SunData, SunEventsClient};
use crate::schedule::{Clock, CronSchedule, parse_time_zone, sleep_until};

use super::{TriggerTask, pulse};

/// Daily refresh, local to the trigger's zone.
const REFRESH_PATTERN: &str = "1 0 * * *";

/// Where a sun events trigger gets its solar times.
pub trait SunDataSource: Send + Sync + 'static {
    /// Fetches today's solar times for a location.
    fn fetch(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> impl Future<Output = Result<SunData, ProtocolError>> + Send;
}

impl SunDataSource for SunEventsClient {
    async fn fetch(&self, latitude: &str, longitude: &str) -> Result<SunData, ProtocolError> {
        SunEventsClient::fetch(self, latitude, longitude).await
    }
}

/// Pulses a sensor at one solar event per day.
#[derive(Debug)]
pub struct SunEventsTrigger {
    event: SunEvent,
    task: TriggerTask,
}

impl SunEventsTrigger {
    /// Starts the daily loop.
    ///
    /// Returns `None` if the event, coordinates or zone are missing or
    /// invalid.
    pub(crate) fn spawn<S: SunDataSource>(
        sensor: Weak<VirtualSensor>,
        accessory_id: String,
        name: &str,
        config: &SunEventsTriggerConfig,
        source: S,
        clock: Arc<dyn Clock>,
    ) -> Option<Self> {
        let Some(event) = config.sun_event() else {
            tracing::error!(accessory = %name, event = ?config.event, "Invalid sun event");
            return None;
        };
        let (Some(latitude), Some(longitude)) = (config.latitude.clone(), config.longitude.clone())
        else {
            tracing::error!(accessory = %name, "Missing sun events coordinates");
            return None;
        };
        let zone = match parse_time_zone(config.zone_id.as_deref().unwrap_or_default()) {
            Ok(zone) => zone,
            Err(e) => {
                tracing::error!(accessory = %name, error = %e, "Invalid sun events zone");
                return None;
            }
        };
        let refresh = match CronSchedule::parse(REFRESH_PATTERN) {
            Ok(refresh) => refresh,
            Err(e) => {
                tracing::error!(accessory = %name, error = %e, "Invalid refresh schedule");
                return None;
            }
        };

        tracing::info!(accessory = %name, %event, zone = %zone, "Sun events trigger armed");
        let name = name.to_string();

        let task = TriggerTask::spawn(async move {
            loop {
                let now = clock.now().with_timezone(&zone);
                let Some(next_refresh) = refresh.next_after(&now) else {
                    break;
                };

                match source.fetch(&latitude, &longitude).await {
                    Ok(data) => {
                        if !fire_once(&*clock, &sensor, &accessory_id, &name, event, &data, zone, &next_refresh)
                            .await
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(accessory = %name, error = %e, "Could not fetch sun data");
                    }
                }

                sleep_until(clock.as_ref(), &next_refresh).await;
                if sensor.strong_count() == 0 {
                    break;
                }
            }
        });

        Some(Self { event, task })
    }

    /// Returns the configured event.
    #[must_use]
    pub fn event(&self) -> SunEvent {
        self.event
    }

    /// Returns `true` while the daily loop runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Cancels the loop and any pending pulse.
    pub fn stop(&self) {
        self.task.stop();
    }
}

/// Waits for today's event and pulses. Returns `false` once the sensor is
/// gone.
#[allow(clippy::too_many_arguments)]
async fn fire_once(
    clock: &dyn Clock,
    sensor: &Weak<VirtualSensor>,
    accessory_id: &str,
    name: &str,
    event: SunEvent,
    data: &SunData,
    zone: Tz,
    next_refresh: &chrono::DateTime<Tz>,
) -> bool {
    let at = match data.event_instant(event) {
        Ok(at) => at.with_timezone(&Utc),
        Err(e) => {
            tracing::error!(accessory = %name, error = %e, "Sun data has no usable event time");
            return true;
        }
    };

    if at <= clock.now() {
        tracing::info!(
            accessory = %name,
            %event,
            at = %at.with_timezone(&zone),
            "Event already passed today, waiting for next refresh"
        );
        return true;
    }
    if at >= next_refresh.with_timezone(&Utc) {
        tracing::debug!(accessory = %name, %event, at = %at, "Event falls after next refresh");
        return true;
    }

    tracing::info!(accessory = %name, %event, at = %at.with_timezone(&zone), "Scheduling sun event");
    sleep_until(clock, &at).await;
    tracing::info!(accessory = %name, %event, "Sun event fired");
    pulse(sensor, accessory_id, false).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::accessory::AccessoryContext;
    use crate::config::{AccessoryConfig, AccessoryKind};
    use crate::event::EventBus;
    use crate::schedule::RuntimeClock;
    use crate::types::{SensorKind, SensorState};

    #[derive(Clone)]
    struct Fixed {
        data: SunData,
        calls: Arc<AtomicU32>,
    }

    impl Fixed {
        fn sunset(at: &str) -> Self {
            let data = serde_json::from_value(serde_json::json!({
                "date": "2030-06-21",
                "sunrise": "5:00:00 AM",
                "sunset": at,
                "timezone": "UTC"
            }))
            .unwrap();
            Self {
                data,
                calls: Arc::default(),
            }
        }
    }

    impl SunDataSource for Fixed {
        async fn fetch(&self, _: &str, _: &str) -> Result<SunData, ProtocolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.clone())
        }
    }

    fn sensor() -> Arc<VirtualSensor> {
        let config = AccessoryConfig::new("sun", "Dusk", AccessoryKind::Sensor);
        let context = AccessoryContext::new(config, None, EventBus::new());
        Arc::new(VirtualSensor::standalone(&context, SensorKind::Occupancy))
    }

    fn clock(h: u32, m: u32, s: u32) -> Arc<RuntimeClock> {
        Arc::new(RuntimeClock::starting_at(
            Utc.with_ymd_and_hms(2030, 6, 21, h, m, s).unwrap(),
        ))
    }

    fn config(event: &str) -> SunEventsTriggerConfig {
        SunEventsTriggerConfig::new(event, "48.85", "2.35", "UTC")
    }

    #[tokio::test(start_paused = true)]
    async fn pulses_at_upcoming_event() {
        let sensor = sensor();
        let source = Fixed::sunset("9:00:30 PM");
        let trigger = SunEventsTrigger::spawn(
            Arc::downgrade(&sensor),
            "sun".into(),
            "Dusk",
            &config("sunset"),
            source.clone(),
            clock(21, 0, 0),
        )
        .unwrap();
        assert_eq!(trigger.event(), SunEvent::Sunset);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(sensor.state(), SensorState::Triggered);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(sensor.state(), SensorState::Normal);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn past_event_waits_for_refresh() {
        let sensor = sensor();
        let source = Fixed::sunset("9:00:30 PM");
        let _trigger = SunEventsTrigger::spawn(
            Arc::downgrade(&sensor),
            "sun".into(),
            "Dusk",
            &config("sunrise"),
            source.clone(),
            clock(23, 59, 0),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sensor.state(), SensorState::Normal);

        // 00:01 next day
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sensor.state(), SensorState::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_pulse() {
        let sensor = sensor();
        let trigger = SunEventsTrigger::spawn(
            Arc::downgrade(&sensor),
            "sun".into(),
            "Dusk",
            &config("sunset"),
            Fixed::sunset("9:00:30 PM"),
            clock(21, 0, 0),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        trigger.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sensor.state(), SensorState::Normal);
        assert!(!trigger.is_running());
    }

    #[tokio::test]
    async fn invalid_configuration_is_not_armed() {
        let sensor = sensor();
        let mut bad = config("sunset");
        bad.zone_id = Some("Nowhere/Special".into());
        assert!(
            SunEventsTrigger::spawn(
                Arc::downgrade(&sensor),
                "sun".into(),
                "Dusk",
                &bad,
                Fixed::sunset("9:00:30 PM"),
                clock(21, 0, 0),
            )
            .is_none()
        );
        assert!(
            SunEventsTrigger::spawn(
                Arc::downgrade(&sensor),
                "sun".into(),
                "Dusk",
                &config("noon"),
                Fixed::sunset("9:00:30 PM"),
                clock(21, 0, 0),
            )
            .is_none()
        );
    }
}
