// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On/off switch with optional reset timer and companion sensor.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::{ConfigError, OwnershipError, Result};
use crate::types::{PowerState, determine_sensor_state};

use super::reset_timer::ResetTimer;
use super::{Accessory, AccessoryContext, VirtualSensor, unsupported};

#[derive(Debug, Serialize, Deserialize)]
struct SwitchRecord {
    #[serde(rename = "SwitchState")]
    state: PowerState,
}

/// A virtual switch.
///
/// Every host write starts the reset timer, if configured, which writes
/// the default back when it fires. Whether a write while the timer is
/// pending restarts the countdown depends on `isResettable`. The companion sensor, if configured, is `Triggered` exactly while
/// the switch is away from its default.
#[derive(Debug)]
pub struct Switch {
    context: AccessoryContext,
    this: Weak<Self>,
    default_state: PowerState,
    state: Mutex<PowerState>,
    reset_timer: Option<ResetTimer>,
    companion: Option<VirtualSensor>,
}

impl Switch {
    /// Creates the switch, restoring its stored state if stateful.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSensorType`] if the companion sensor
    /// type is unknown.
    pub fn new(context: AccessoryContext) -> std::result::Result<Arc<Self>, ConfigError> {
        let config = context.config();
        let default_state = config.switch_default_state();
        let state = context
            .load_state::<SwitchRecord>()
            .map_or(default_state, |record| record.state);

        let companion = match (&config.companion_sensor, config.accessory_has_companion_sensor) {
            (Some(sensor), true) => Some(VirtualSensor::companion(
                &context,
                sensor,
                determine_sensor_state(&state, &default_state),
            )?),
            _ => None,
        };
        let reset_timer = config
            .reset_timer
            .clone()
            .filter(|_| config.accessory_has_reset_timer)
            .map(|timer| ResetTimer::new(context.name(), timer));

        let switch = Arc::new_cyclic(|this| Self {
            context,
            this: this.clone(),
            default_state,
            state: Mutex::new(state),
            reset_timer,
            companion,
        });
        switch
            .context
            .publish(ServiceRole::Primary, Characteristic::On, state.is_on());
        Ok(switch)
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> PowerState {
        *self.state.lock()
    }

    /// Returns the configured default state.
    #[must_use]
    pub fn default_state(&self) -> PowerState {
        self.default_state
    }

    /// Returns the companion sensor, if any.
    #[must_use]
    pub fn companion_sensor(&self) -> Option<&VirtualSensor> {
        self.companion.as_ref()
    }

    /// Returns the seconds left before the switch resets, or 0.
    #[must_use]
    pub fn reset_remaining_secs(&self) -> u64 {
        self.reset_timer.as_ref().map_or(0, ResetTimer::remaining_secs)
    }

    /// Sets the switch state and cascades to timer, companion and storage.
    ///
    /// # Errors
    ///
    /// Returns an [`OwnershipError`] if the companion sensor rejects the
    /// update.
    pub fn set_state(&self, state: PowerState) -> std::result::Result<(), OwnershipError> {
        self.apply_state(state, true)
    }

    fn apply_state(
        &self,
        state: PowerState,
        arm_reset: bool,
    ) -> std::result::Result<(), OwnershipError> {
        *self.state.lock() = state;
        tracing::info!(accessory = %self.context.name(), state = %state, "Setting switch state");
        self.context
            .publish(ServiceRole::Primary, Characteristic::On, state.is_on());

        if let Some(timer) = self.reset_timer.as_ref().filter(|_| arm_reset) {
            let this = self.this.clone();
            timer.start(move || {
                if let Some(switch) = this.upgrade() {
                    // The expiry itself does not re-arm the countdown
                    if let Err(e) = switch.apply_state(switch.default_state, false) {
                        tracing::error!(error = %e, "Failed to reset switch");
                    }
                }
            });
        }

        if let Some(companion) = &self.companion {
            companion.trigger_companion_sensor_state(
                determine_sensor_state(&state, &self.default_state),
                &self.context.uuid(),
            )?;
        }

        self.context.save_state(&SwitchRecord { state });
        Ok(())
    }
}

impl Accessory for Switch {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::Switch
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        match (service, characteristic) {
            (ServiceRole::Primary, Characteristic::On) => {
                let state = self.state();
                tracing::debug!(accessory = %self.context.name(), state = %state, "Getting switch state");
                Ok(state.is_on().into())
            }
            (ServiceRole::CompanionSensor, _) => match &self.companion {
                Some(companion) => companion.handle_get(characteristic),
                None => unsupported(characteristic),
            },
            _ => unsupported(characteristic),
        }
    }

    fn handle_set(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()> {
        match (service, characteristic) {
            (ServiceRole::Primary, Characteristic::On) => {
                let on = value.as_bool(characteristic)?;
                Ok(self.set_state(PowerState::from(on))?)
            }
            _ => unsupported(characteristic),
        }
    }

    fn shutdown(&self) {
        if let Some(timer) = &self.reset_timer {
            timer.stop();
        }
    }
}
