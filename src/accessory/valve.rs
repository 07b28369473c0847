// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Water valve with an automatic shut-off.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::{AccessoryKind, MAX_VALVE_DURATION};
use crate::error::Result;
use crate::timer::DurationTimer;
use crate::types::{TimeUnit, ValveActive, ValveInUse, ValveType};

use super::{Accessory, AccessoryContext, decode, unsupported};

#[derive(Debug, Serialize, Deserialize)]
struct ValveRecord {
    #[serde(rename = "ValveActive")]
    active: ValveActive,
}

/// A virtual valve.
///
/// `InUse` always mirrors `Active`. Activating arms a non-resettable
/// shut-off timer for the run duration; deactivating cancels it.
#[derive(Debug)]
pub struct Valve {
    context: AccessoryContext,
    this: Weak<Self>,
    valve_type: ValveType,
    active: Mutex<ValveActive>,
    shut_off: DurationTimer,
}

impl Valve {
    /// Creates the valve, restoring its stored state if stateful.
    ///
    /// A valve restored as active gets a fresh run duration.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Arc<Self> {
        let config = context.config();
        let valve_type = config.valve_type();
        let active = context
            .load_state::<ValveRecord>()
            .map_or(ValveActive::Inactive, |r| r.active);
        let shut_off = DurationTimer::new(format!("{} shut-off", context.name()), false)
            .with_duration(config.valve_duration_secs(), TimeUnit::Seconds);

        let valve = Arc::new_cyclic(|this| Self {
            context,
            this: this.clone(),
            valve_type,
            active: Mutex::new(active),
            shut_off,
        });
        valve.context.publish(
            ServiceRole::Primary,
            Characteristic::ValveType,
            valve_type.as_num(),
        );
        valve.push(active);
        if active == ValveActive::Active {
            valve.arm_shut_off();
        }
        valve
    }

    /// Returns whether the valve is active.
    #[must_use]
    pub fn active(&self) -> ValveActive {
        *self.active.lock()
    }

    /// Returns whether water is flowing.
    #[must_use]
    pub fn in_use(&self) -> ValveInUse {
        self.active().in_use()
    }

    /// Returns the configured run duration in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.shut_off.duration_secs()
    }

    /// Returns the seconds left before shut-off, or 0.
    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.shut_off.remaining_secs()
    }

    /// Opens or closes the valve.
    pub fn set_active(&self, active: ValveActive) {
        *self.active.lock() = active;
        tracing::info!(accessory = %self.context.name(), state = %active, "Setting valve state");
        self.push(active);

        match active {
            ValveActive::Active => self.arm_shut_off(),
            ValveActive::Inactive => self.shut_off.stop(),
        }
        self.context.save_state(&ValveRecord { active });
    }

    /// Sets the run duration used by the next activation.
    pub fn set_duration(&self, secs: u64) {
        tracing::info!(accessory = %self.context.name(), seconds = secs, "Setting valve duration");
        self.shut_off.set_duration(secs, TimeUnit::Seconds);
        self.context
            .publish(ServiceRole::Primary, Characteristic::SetDuration, secs);
    }

    fn arm_shut_off(&self) {
        let this = self.this.clone();
        self.shut_off.start(move || {
            if let Some(valve) = this.upgrade() {
                valve.set_active(ValveActive::Inactive);
            }
        });
        self.context.publish(
            ServiceRole::Primary,
            Characteristic::RemainingDuration,
            self.shut_off.remaining_secs(),
        );
    }

    fn push(&self, active: ValveActive) {
        self.context
            .publish(ServiceRole::Primary, Characteristic::Active, active.as_num());
        self.context
            .publish(ServiceRole::Primary, Characteristic::InUse, active.in_use().as_num());
    }
}

impl Accessory for Valve {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::Valve
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        if service != ServiceRole::Primary {
            return unsupported(characteristic);
        }
        match characteristic {
            Characteristic::Active => Ok(self.active().as_num().into()),
            Characteristic::InUse => Ok(self.in_use().as_num().into()),
            Characteristic::ValveType => Ok(self.valve_type.as_num().into()),
            Characteristic::SetDuration => Ok(self.duration_secs().into()),
            Characteristic::RemainingDuration => Ok(self.remaining_secs().into()),
            _ => unsupported(characteristic),
        }
    }

    fn handle_set(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()> {
        if service != ServiceRole::Primary {
            return unsupported(characteristic);
        }
        match characteristic {
            Characteristic::Active => self.set_active(decode(characteristic, &value)?),
            Characteristic::SetDuration => {
                let secs = value.as_int_in(characteristic, 0, MAX_VALVE_DURATION)?;
                self.set_duration(secs.unsigned_abs());
            }
            _ => return unsupported(characteristic),
        }
        Ok(())
    }

    fn shutdown(&self) {
        self.shut_off.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::AccessoryConfig;
    use crate::event::EventBus;

    fn valve(duration: i64) -> Arc<Valve> {
        let config = AccessoryConfig {
            valve_type: Some("irrigation".into()),
            valve_duration: Some(duration),
            ..AccessoryConfig::new("v", "Sprinkler", AccessoryKind::Valve)
        };
        Valve::new(AccessoryContext::new(config, None, EventBus::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn shuts_off_after_duration() {
        let valve = valve(5);
        valve.set_active(ValveActive::Active);
        assert_eq!(valve.in_use(), ValveInUse::InUse);
        assert_eq!(valve.remaining_secs(), 5);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(valve.active(), ValveActive::Inactive);
        assert_eq!(valve.in_use(), ValveInUse::NotInUse);
        assert_eq!(valve.remaining_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reactivation_keeps_original_deadline() {
        let valve = valve(10);
        valve.set_active(ValveActive::Active);
        tokio::time::sleep(Duration::from_secs(4)).await;
        valve.set_active(ValveActive::Active);
        assert_eq!(valve.remaining_secs(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_cancels_shut_off() {
        let valve = valve(10);
        valve.set_active(ValveActive::Active);
        valve.set_active(ValveActive::Inactive);
        assert_eq!(valve.remaining_secs(), 0);
        assert_eq!(valve.in_use(), ValveInUse::NotInUse);
    }

    fn restored_active(dir: &std::path::Path) -> Arc<Valve> {
        crate::storage::StateStorage::for_accessory(dir, "v")
            .save(&serde_json::json!({ "ValveActive": 1 }));
        let config = AccessoryConfig {
            valve_type: Some("irrigation".into()),
            valve_duration: Some(30),
            ..AccessoryConfig::new("v", "Sprinkler", AccessoryKind::Valve).stateful()
        };
        Valve::new(AccessoryContext::new(config, Some(dir), EventBus::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn restored_active_valve_gets_fresh_run() {
        let dir = tempfile::tempdir().unwrap();
        let valve = restored_active(dir.path());
        assert_eq!(valve.active(), ValveActive::Active);
        assert_eq!(valve.remaining_secs(), 30);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(valve.active(), ValveActive::Inactive);
    }

    #[test]
    fn restored_active_valve_outside_runtime_is_not_armed() {
        let dir = tempfile::tempdir().unwrap();
        let valve = restored_active(dir.path());
        assert_eq!(valve.active(), ValveActive::Active);
        assert_eq!(valve.remaining_secs(), 0);
    }

    #[tokio::test]
    async fn duration_writes_are_bounded() {
        let valve = valve(10);
        valve
            .handle_set(ServiceRole::Primary, Characteristic::SetDuration, CharacteristicValue::Int(120))
            .unwrap();
        assert_eq!(valve.duration_secs(), 120);
        assert!(
            valve
                .handle_set(ServiceRole::Primary, Characteristic::SetDuration, CharacteristicValue::Int(3601))
                .is_err()
        );
        assert_eq!(
            valve.handle_get(ServiceRole::Primary, Characteristic::ValveType).unwrap(),
            CharacteristicValue::Int(1)
        );
    }
}
