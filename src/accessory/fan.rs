// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::Result;
use crate::types::{Percentage, PowerState, RotationDirection};

use super::{Accessory, AccessoryContext, decode, unsupported};

/// Stored and live fan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanState {
    /// Power.
    #[serde(rename = "FanState")]
    pub power: PowerState,
    /// Rotation direction.
    #[serde(rename = "FanRotationDirection")]
    pub direction: RotationDirection,
    /// Rotation speed.
    #[serde(rename = "FanRotationSpeed")]
    pub speed: Percentage,
}

/// A virtual fan.
#[derive(Debug)]
pub struct Fan {
    context: AccessoryContext,
    state: Mutex<FanState>,
}

impl Fan {
    /// Creates the fan, restoring its stored state if stateful.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Self {
        let fan = context.config().fan.clone().unwrap_or_default();
        let default_state = FanState {
            power: fan.default_state(),
            direction: fan.rotation_direction(),
            speed: fan.rotation_speed(),
        };
        let state = context.load_state().unwrap_or(default_state);

        let fan = Self {
            context,
            state: Mutex::new(state),
        };
        fan.push(Characteristic::On, state.power.is_on());
        fan.push(Characteristic::RotationDirection, state.direction.as_num());
        fan.push(Characteristic::RotationSpeed, state.speed.value());
        fan
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> FanState {
        *self.state.lock()
    }

    /// Turns the fan on or off.
    pub fn set_power(&self, power: PowerState) {
        self.update(|state| state.power = power);
        tracing::info!(accessory = %self.context.name(), state = %power, "Setting fan state");
        self.push(Characteristic::On, power.is_on());
    }

    /// Sets the rotation direction.
    pub fn set_direction(&self, direction: RotationDirection) {
        self.update(|state| state.direction = direction);
        tracing::info!(accessory = %self.context.name(), direction = %direction, "Setting fan rotation direction");
        self.push(Characteristic::RotationDirection, direction.as_num());
    }

    /// Sets the rotation speed.
    pub fn set_speed(&self, speed: Percentage) {
        self.update(|state| state.speed = speed);
        tracing::info!(accessory = %self.context.name(), speed = %speed, "Setting fan rotation speed");
        self.push(Characteristic::RotationSpeed, speed.value());
    }

    fn update(&self, apply: impl FnOnce(&mut FanState)) {
        let record = {
            let mut state = self.state.lock();
            apply(&mut state);
            *state
        };
        self.context.save_state(&record);
    }

    fn push(&self, characteristic: Characteristic, value: impl Into<CharacteristicValue>) {
        self.context.publish(ServiceRole::Primary, characteristic, value);
    }
}

impl Accessory for Fan {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::Fan
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        if service != ServiceRole::Primary {
            return unsupported(characteristic);
        }
        let state = self.state();
        match characteristic {
            Characteristic::On => Ok(state.power.is_on().into()),
            Characteristic::RotationDirection => Ok(state.direction.as_num().into()),
            Characteristic::RotationSpeed => Ok(state.speed.value().into()),
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
            Characteristic::On => self.set_power(value.as_bool(characteristic)?.into()),
            Characteristic::RotationDirection => self.set_direction(decode(characteristic, &value)?),
            Characteristic::RotationSpeed => self.set_speed(decode(characteristic, &value)?),
            _ => return unsupported(characteristic),
        }
        Ok(())
    }
}
