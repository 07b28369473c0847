// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-valued sensors and the companion sensor bridge.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::{AccessoryKind, CompanionSensorConfig};
use crate::error::{ConfigError, OwnershipError, Result};
use crate::event::{AccessoryEvent, AccessoryUuid, EventBus};
use crate::trigger::{Trigger, TriggerEnvironment};
use crate::types::{SensorKind, SensorState};

use super::{Accessory, AccessoryContext, unsupported};

/// A sensor service whose state is pushed in from outside.
///
/// The host can only read a sensor. Its state changes through two guarded
/// entry points:
///
/// - [`trigger_companion_sensor_state`](Self::trigger_companion_sensor_state)
///   for a companion sensor, callable only by the accessory it is exposed on;
/// - [`trigger_key_sensor_state`](Self::trigger_key_sensor_state) for a
///   standalone sensor, callable only by a trigger constructed against the
///   same accessory.
///
/// Rejected calls leave the state untouched.
#[derive(Debug)]
pub struct VirtualSensor {
    name: String,
    accessory: AccessoryUuid,
    accessory_id: String,
    kind: SensorKind,
    service: ServiceRole,
    events: EventBus,
    state: Mutex<SensorState>,
}

impl VirtualSensor {
    /// Creates the primary sensor service of a sensor accessory.
    #[must_use]
    pub fn standalone(context: &AccessoryContext, kind: SensorKind) -> Self {
        Self {
            name: context.name().to_string(),
            accessory: context.uuid(),
            accessory_id: context.id().to_string(),
            kind,
            service: ServiceRole::Primary,
            events: context.events().clone(),
            state: Mutex::new(SensorState::Normal),
        }
    }

    /// Creates a companion sensor service on another accessory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSensorType`] if the companion type is
    /// not a known sensor kind.
    pub fn companion(
        context: &AccessoryContext,
        config: &CompanionSensorConfig,
        initial: SensorState,
    ) -> std::result::Result<Self, ConfigError> {
        let kind = config.kind().ok_or_else(|| {
            ConfigError::UnknownSensorType(config.sensor_type.clone().unwrap_or_default())
        })?;
        let sensor = Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| format!("{} Sensor", context.name())),
            accessory: context.uuid(),
            accessory_id: context.id().to_string(),
            kind,
            service: ServiceRole::CompanionSensor,
            events: context.events().clone(),
            state: Mutex::new(initial),
        };
        sensor.push(initial);
        Ok(sensor)
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sensor kind.
    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SensorState {
        *self.state.lock()
    }

    /// Returns `true` for a companion sensor service.
    #[must_use]
    pub fn is_companion(&self) -> bool {
        self.service == ServiceRole::CompanionSensor
    }

    /// Answers a host read of the sensor characteristic.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedCharacteristic`] for any other
    /// characteristic.
    pub fn handle_get(&self, characteristic: Characteristic) -> Result<CharacteristicValue> {
        if characteristic != self.kind.characteristic() {
            return unsupported(characteristic);
        }
        let state = self.state();
        tracing::debug!(
            sensor = %self.name,
            state = self.kind.state_name(state),
            "Getting sensor state"
        );
        Ok(self.kind.encode(state))
    }

    /// Sets the state of a companion sensor on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError::NotCompanion`] if this is not a companion
    /// sensor, or [`OwnershipError::AccessoryNotAllowed`] if `caller` is not
    /// the accessory the sensor is exposed on.
    pub fn trigger_companion_sensor_state(
        &self,
        state: SensorState,
        caller: &AccessoryUuid,
    ) -> std::result::Result<(), OwnershipError> {
        if !self.is_companion() {
            return Err(OwnershipError::NotCompanion {
                sensor: self.name.clone(),
            });
        }
        if *caller != self.accessory {
            return Err(OwnershipError::AccessoryNotAllowed {
                caller: caller.to_string(),
                sensor: self.name.clone(),
            });
        }

        *self.state.lock() = state;
        self.push(state);
        tracing::info!(
            sensor = %self.name,
            state = self.kind.state_name(state),
            "Setting companion sensor state"
        );
        Ok(())
    }

    /// Sets the state of a sensor on behalf of its trigger.
    ///
    /// The new value is always pushed to the host. It is logged only when
    /// it differs from the previous one and `quiet` is false.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError::TriggerNotAllowed`] if the trigger was
    /// constructed against another accessory.
    pub fn trigger_key_sensor_state(
        &self,
        state: SensorState,
        trigger_accessory_id: &str,
        quiet: bool,
    ) -> std::result::Result<(), OwnershipError> {
        if trigger_accessory_id != self.accessory_id {
            return Err(OwnershipError::TriggerNotAllowed {
                trigger: trigger_accessory_id.to_string(),
                sensor: self.name.clone(),
            });
        }

        let changed = {
            let mut current = self.state.lock();
            let changed = *current != state;
            *current = state;
            changed
        };
        self.push(state);
        if changed && !quiet {
            tracing::info!(
                sensor = %self.name,
                state = self.kind.state_name(state),
                "Setting sensor state"
            );
        }
        Ok(())
    }

    fn push(&self, state: SensorState) {
        self.events.publish(AccessoryEvent::characteristic_changed(
            self.accessory,
            self.service,
            self.kind.characteristic(),
            self.kind.encode(state),
        ));
    }
}

/// A standalone sensor accessory, optionally driven by one trigger.
#[derive(Debug)]
pub struct SensorAccessory {
    context: AccessoryContext,
    sensor: Arc<VirtualSensor>,
    trigger: Mutex<Option<Trigger>>,
}

impl SensorAccessory {
    /// Creates the sensor and arms its trigger.
    ///
    /// A trigger whose configuration is defective, or is disabled, is not
    /// armed; the sensor still answers reads.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSensorType`] if `sensorType` is not a
    /// known kind, or [`ConfigError::UnknownTriggerType`] if
    /// `sensorTrigger` is set to an unknown kind.
    pub fn new(
        context: AccessoryContext,
        environment: &TriggerEnvironment,
    ) -> std::result::Result<Arc<Self>, ConfigError> {
        let config = context.config();
        let kind = config.sensor_kind().ok_or_else(|| {
            ConfigError::UnknownSensorType(config.sensor_type.clone().unwrap_or_default())
        })?;
        if let Some(raw) = config.sensor_trigger.as_deref() {
            if config.trigger_kind().is_none() {
                return Err(ConfigError::UnknownTriggerType(raw.to_string()));
            }
        }

        let sensor = Arc::new(VirtualSensor::standalone(&context, kind));
        sensor.push(SensorState::Normal);

        let trigger = Trigger::create(&sensor, context.config(), environment);
        Ok(Arc::new(Self {
            context,
            sensor,
            trigger: Mutex::new(trigger),
        }))
    }

    /// Returns the sensor service.
    #[must_use]
    pub fn sensor(&self) -> &Arc<VirtualSensor> {
        &self.sensor
    }

    /// Returns `true` while a trigger is armed.
    #[must_use]
    pub fn has_trigger(&self) -> bool {
        self.trigger.lock().is_some()
    }
}

impl Accessory for SensorAccessory {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::Sensor
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        match service {
            ServiceRole::Primary => self.sensor.handle_get(characteristic),
            _ => unsupported(characteristic),
        }
    }

    fn handle_set(
        &self,
        _service: ServiceRole,
        characteristic: Characteristic,
        _value: CharacteristicValue,
    ) -> Result<()> {
        unsupported(characteristic)
    }

    fn shutdown(&self) {
        if let Some(trigger) = self.trigger.lock().take() {
            trigger.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessoryConfig;
    use crate::error::Error;

    fn sensor_context(id: &str, kind: SensorKind) -> AccessoryContext {
        let config = AccessoryConfig {
            sensor_type: Some(kind.as_str().to_string()),
            ..AccessoryConfig::new(id, format!("{id} sensor"), AccessoryKind::Sensor)
        };
        AccessoryContext::new(config, None, EventBus::new())
    }

    fn switch_context(id: &str) -> AccessoryContext {
        let config = AccessoryConfig {
            switch_default_state: Some("off".into()),
            ..AccessoryConfig::new(id, "Switch", AccessoryKind::Switch)
        };
        AccessoryContext::new(config, None, EventBus::new())
    }

    #[test]
    fn companion_rejects_foreign_accessory() {
        let owner = switch_context("owner");
        let config = CompanionSensorConfig::new("Contact", SensorKind::Contact);
        let sensor = VirtualSensor::companion(&owner, &config, SensorState::Normal).unwrap();

        let intruder = AccessoryUuid::from_accessory_id("intruder");
        let err = sensor
            .trigger_companion_sensor_state(SensorState::Triggered, &intruder)
            .unwrap_err();
        assert!(matches!(err, OwnershipError::AccessoryNotAllowed { .. }));
        assert_eq!(sensor.state(), SensorState::Normal);

        sensor
            .trigger_companion_sensor_state(SensorState::Triggered, &owner.uuid())
            .unwrap();
        assert_eq!(sensor.state(), SensorState::Triggered);
    }

    #[test]
    fn standalone_is_not_a_companion() {
        let context = sensor_context("motion", SensorKind::Motion);
        let sensor = VirtualSensor::standalone(&context, SensorKind::Motion);
        let err = sensor
            .trigger_companion_sensor_state(SensorState::Triggered, &context.uuid())
            .unwrap_err();
        assert!(matches!(err, OwnershipError::NotCompanion { .. }));
        assert_eq!(sensor.state(), SensorState::Normal);
    }

    #[test]
    fn trigger_must_belong_to_sensor() {
        let context = sensor_context("leak", SensorKind::Leak);
        let sensor = VirtualSensor::standalone(&context, SensorKind::Leak);

        let err = sensor
            .trigger_key_sensor_state(SensorState::Triggered, "other", false)
            .unwrap_err();
        assert!(matches!(err, OwnershipError::TriggerNotAllowed { .. }));
        assert_eq!(sensor.state(), SensorState::Normal);

        sensor
            .trigger_key_sensor_state(SensorState::Triggered, "leak", false)
            .unwrap();
        assert_eq!(sensor.state(), SensorState::Triggered);
    }

    #[test]
    fn key_state_is_pushed_even_when_unchanged() {
        let context = sensor_context("smoke", SensorKind::Smoke);
        let mut rx = context.events().subscribe();
        let sensor = VirtualSensor::standalone(&context, SensorKind::Smoke);

        sensor
            .trigger_key_sensor_state(SensorState::Normal, "smoke", true)
            .unwrap();
        sensor
            .trigger_key_sensor_state(SensorState::Normal, "smoke", true)
            .unwrap();

        for _ in 0..2 {
            assert_eq!(
                rx.try_recv().unwrap(),
                AccessoryEvent::characteristic_changed(
                    context.uuid(),
                    ServiceRole::Primary,
                    Characteristic::SmokeDetected,
                    0u8,
                )
            );
        }
    }

    #[test]
    fn reads_are_typed_by_kind() {
        let context = sensor_context("m", SensorKind::Motion);
        let sensor = VirtualSensor::standalone(&context, SensorKind::Motion);
        assert_eq!(
            sensor.handle_get(Characteristic::MotionDetected).unwrap(),
            CharacteristicValue::Bool(false)
        );
        assert!(matches!(
            sensor.handle_get(Characteristic::ContactSensorState),
            Err(Error::UnsupportedCharacteristic(Characteristic::ContactSensorState))
        ));
    }

    #[tokio::test]
    async fn sensor_accessory_without_trigger_is_read_only() {
        let context = sensor_context("occ", SensorKind::Occupancy);
        let accessory = SensorAccessory::new(context, &TriggerEnvironment::default()).unwrap();
        assert!(!accessory.has_trigger());
        assert_eq!(
            accessory
                .handle_get(ServiceRole::Primary, Characteristic::OccupancyDetected)
                .unwrap(),
            CharacteristicValue::Int(0)
        );
        assert!(
            accessory
                .handle_set(
                    ServiceRole::Primary,
                    Characteristic::OccupancyDetected,
                    CharacteristicValue::Int(1),
                )
                .is_err()
        );
    }
}
