// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests driving accessories through the platform.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use virtual_accessories::accessory::{AccessoryContext, Doorbell};
use virtual_accessories::schedule::RuntimeClock;
use virtual_accessories::types::{SensorKind, SensorState};
use virtual_accessories::{
    AccessoryConfig, AccessoryEvent, AccessoryKind, AccessoryUuid, Characteristic,
    CharacteristicValue, Error, EventBus, OwnershipError, Platform, PlatformConfig, ServiceRole,
    TriggerEnvironment,
};

fn platform(devices: serde_json::Value) -> Platform {
    let config: PlatformConfig =
        serde_json::from_value(serde_json::json!({ "devices": devices })).unwrap();
    Platform::new(config, EventBus::new())
}

fn uuid(id: &str) -> AccessoryUuid {
    AccessoryUuid::from_accessory_id(id)
}

fn on(platform: &Platform, id: &str) -> bool {
    platform
        .handle_get(uuid(id), ServiceRole::Primary, Characteristic::On)
        .unwrap()
        .as_bool(Characteristic::On)
        .unwrap()
}

// ============================================================================
// Switch
// ============================================================================

mod switch {
    use super::*;

    #[tokio::test]
    async fn companion_sensor_follows_switch() {
        let platform = platform(serde_json::json!([{
            "accessoryID": "garage-light",
            "accessoryName": "Garage Light",
            "accessoryType": "switch",
            "switchDefaultState": "off",
            "accessoryHasCompanionSensor": true,
            "companionSensor": { "name": "Garage Light Sensor", "type": "contact" }
        }]));
        platform.discover_devices(&[]);
        let mut events = platform.subscribe();
        let id = uuid("garage-light");
        let contact = Characteristic::ContactSensorState;

        platform
            .handle_set(id, ServiceRole::Primary, Characteristic::On, true.into())
            .unwrap();
        assert_eq!(
            platform.handle_get(id, ServiceRole::CompanionSensor, contact).unwrap(),
            SensorKind::Contact.encode(SensorState::Triggered)
        );

        platform
            .handle_set(id, ServiceRole::Primary, Characteristic::On, false.into())
            .unwrap();
        assert_eq!(
            platform.handle_get(id, ServiceRole::CompanionSensor, contact).unwrap(),
            SensorKind::Contact.encode(SensorState::Normal)
        );

        let mut companion = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let AccessoryEvent::CharacteristicChanged {
                service: ServiceRole::CompanionSensor,
                value,
                ..
            } = event
            {
                companion.push(value);
            }
        }
        assert_eq!(
            companion,
            vec![
                SensorKind::Contact.encode(SensorState::Triggered),
                SensorKind::Contact.encode(SensorState::Normal)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_timer_restores_default() {
        let platform = platform(serde_json::json!([{
            "accessoryID": "bell",
            "accessoryName": "Bell",
            "accessoryType": "switch",
            "switchDefaultState": "off",
            "accessoryHasResetTimer": true,
            "resetTimer": { "duration": 5, "units": "seconds" }
        }]));
        platform.discover_devices(&[]);

        platform
            .handle_set(uuid("bell"), ServiceRole::Primary, Characteristic::On, true.into())
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(on(&platform, "bell"));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!on(&platform, "bell"));
    }

    #[tokio::test]
    async fn state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let devices = serde_json::json!([{
            "accessoryID": "heater",
            "accessoryName": "Heater",
            "accessoryType": "switch",
            "switchDefaultState": "off",
            "accessoryIsStateful": true
        }]);
        let config = || {
            serde_json::from_value::<PlatformConfig>(serde_json::json!({ "devices": devices }))
                .unwrap()
                .with_storage_path(dir.path())
        };

        let first = Platform::new(config(), EventBus::new());
        first.discover_devices(&[]);
        first
            .handle_set(uuid("heater"), ServiceRole::Primary, Characteristic::On, true.into())
            .unwrap();
        drop(first);

        let second = Platform::new(config(), EventBus::new());
        let report = second.discover_devices(&[uuid("heater")]);
        assert_eq!(report.restored, vec![uuid("heater")]);
        assert!(on(&second, "heater"));
    }
}

// ============================================================================
// Valve
// ============================================================================

mod valve {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn shuts_off_after_duration() {
        let platform = platform(serde_json::json!([{
            "accessoryID": "sprinkler",
            "accessoryName": "Sprinkler",
            "accessoryType": "valve",
            "valveType": "irrigation",
            "valveDuration": 5
        }]));
        platform.discover_devices(&[]);
        let id = uuid("sprinkler");
        let active = |p: &Platform| {
            p.handle_get(id, ServiceRole::Primary, Characteristic::Active)
                .unwrap()
        };

        platform
            .handle_set(id, ServiceRole::Primary, Characteristic::Active, 1u8.into())
            .unwrap();
        assert_eq!(active(&platform), CharacteristicValue::from(1u8));
        assert_eq!(
            platform
                .handle_get(id, ServiceRole::Primary, Characteristic::RemainingDuration)
                .unwrap(),
            CharacteristicValue::from(5u64)
        );

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(active(&platform), CharacteristicValue::from(0u8));
        assert_eq!(
            platform
                .handle_get(id, ServiceRole::Primary, Characteristic::InUse)
                .unwrap(),
            CharacteristicValue::from(0u8)
        );
    }
}

// ============================================================================
// Sensor triggers
// ============================================================================

mod triggers {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cron_sensor_pulses_through_platform() {
        let platform = platform(serde_json::json!([{
            "accessoryID": "every-minute",
            "accessoryName": "Every Minute",
            "accessoryType": "sensor",
            "sensorType": "contact",
            "sensorTrigger": "cron",
            "cronTrigger": { "pattern": "* * * * *", "zoneId": "UTC" }
        }]))
        .with_environment(TriggerEnvironment::default().with_clock(Arc::new(
            RuntimeClock::starting_at(Utc.with_ymd_and_hms(2030, 3, 1, 12, 0, 30).unwrap()),
        )));
        platform.discover_devices(&[]);
        let read = |p: &Platform| {
            p.handle_get(
                uuid("every-minute"),
                ServiceRole::Primary,
                Characteristic::ContactSensorState,
            )
            .unwrap()
        };

        assert_eq!(read(&platform), SensorKind::Contact.encode(SensorState::Normal));
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(read(&platform), SensorKind::Contact.encode(SensorState::Triggered));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(read(&platform), SensorKind::Contact.encode(SensorState::Normal));

        platform.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn cron_window_holds_pulses_until_start() {
        let platform = platform(serde_json::json!([{
            "accessoryID": "after-lunch",
            "accessoryName": "After Lunch",
            "accessoryType": "sensor",
            "sensorType": "contact",
            "sensorTrigger": "cron",
            "cronTrigger": {
                "pattern": "* * * * *",
                "zoneId": "UTC",
                "startDateTime": "2030-03-01T13:00:00"
            }
        }]))
        .with_environment(TriggerEnvironment::default().with_clock(Arc::new(
            RuntimeClock::starting_at(Utc.with_ymd_and_hms(2030, 3, 1, 12, 0, 30).unwrap()),
        )));
        platform.discover_devices(&[]);
        let mut events = platform.subscribe();
        let read = |p: &Platform| {
            p.handle_get(
                uuid("after-lunch"),
                ServiceRole::Primary,
                Characteristic::ContactSensorState,
            )
            .unwrap()
        };

        // 13:00:00 is 3570 s after the origin
        tokio::time::sleep(Duration::from_secs(3569)).await;
        assert_eq!(read(&platform), SensorKind::Contact.encode(SensorState::Normal));
        assert!(events.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(read(&platform), SensorKind::Contact.encode(SensorState::Triggered));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(read(&platform), SensorKind::Contact.encode(SensorState::Normal));

        let mut pushed = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let AccessoryEvent::CharacteristicChanged {
                characteristic: Characteristic::ContactSensorState,
                value,
                ..
            } = event
            {
                pushed.push(value);
            }
        }
        assert_eq!(
            pushed,
            vec![
                SensorKind::Contact.encode(SensorState::Triggered),
                SensorKind::Contact.encode(SensorState::Normal)
            ]
        );

        platform.shutdown();
    }

    #[tokio::test]
    async fn invalid_trigger_configuration_rejects_sensor() {
        let platform = platform(serde_json::json!([{
            "accessoryID": "broken",
            "accessoryName": "Broken",
            "accessoryType": "sensor",
            "sensorType": "motion",
            "sensorTrigger": "cron",
            "cronTrigger": { "pattern": "0 0 0 * * *", "zoneId": "UTC" }
        }]));
        let report = platform.discover_devices(&[]);
        assert_eq!(report.rejected, vec!["Broken".to_string()]);
    }
}

// ============================================================================
// Ownership
// ============================================================================

mod ownership {
    use super::*;

    #[tokio::test]
    async fn doorbell_rejects_foreign_ring() {
        let config = AccessoryConfig {
            doorbell_volume: Some(60),
            ..AccessoryConfig::new("door", "Front Door", AccessoryKind::Doorbell)
        };
        let doorbell = Doorbell::new(AccessoryContext::new(config, None, EventBus::new()));

        let result = doorbell.ring(&uuid("someone-else"));
        assert!(matches!(
            result,
            Err(OwnershipError::AccessoryNotAllowed { .. })
        ));
        assert!(doorbell.ring(&uuid("door")).is_ok());
    }

    #[tokio::test]
    async fn unknown_accessory_is_not_found() {
        let platform = platform(serde_json::json!([]));
        platform.discover_devices(&[]);
        assert!(matches!(
            platform.handle_get(uuid("ghost"), ServiceRole::Primary, Characteristic::On),
            Err(Error::AccessoryNotFound)
        ));
    }
}
