// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::Result;
use crate::types::{Percentage, PowerState};

use super::{Accessory, AccessoryContext, decode, unsupported};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct LightbulbRecord {
    #[serde(rename = "LightbulbState")]
    power: PowerState,
    #[serde(rename = "LightbulbBrightness")]
    brightness: Percentage,
}

/// A dimmable virtual lightbulb.
#[derive(Debug)]
pub struct Lightbulb {
    context: AccessoryContext,
    state: Mutex<LightbulbRecord>,
}

impl Lightbulb {
    /// Creates the lightbulb, restoring its stored state if stateful.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Self {
        let bulb = context.config().lightbulb.clone().unwrap_or_default();
        let state = context.load_state().unwrap_or(LightbulbRecord {
            power: bulb.default_state(),
            brightness: bulb.brightness(),
        });

        let lightbulb = Self {
            context,
            state: Mutex::new(state),
        };
        lightbulb
            .context
            .publish(ServiceRole::Primary, Characteristic::On, state.power.is_on());
        lightbulb.context.publish(
            ServiceRole::Primary,
            Characteristic::Brightness,
            state.brightness.value(),
        );
        lightbulb
    }

    /// Returns the power state.
    #[must_use]
    pub fn power(&self) -> PowerState {
        self.state.lock().power
    }

    /// Returns the brightness.
    #[must_use]
    pub fn brightness(&self) -> Percentage {
        self.state.lock().brightness
    }

    /// Turns the lightbulb on or off.
    pub fn set_power(&self, power: PowerState) {
        let record = {
            let mut state = self.state.lock();
            state.power = power;
            *state
        };
        tracing::info!(accessory = %self.context.name(), state = %power, "Setting lightbulb state");
        self.context
            .publish(ServiceRole::Primary, Characteristic::On, power.is_on());
        self.context.save_state(&record);
    }

    /// Sets the brightness.
    pub fn set_brightness(&self, brightness: Percentage) {
        let record = {
            let mut state = self.state.lock();
            state.brightness = brightness;
            *state
        };
        tracing::info!(accessory = %self.context.name(), brightness = %brightness, "Setting lightbulb brightness");
        self.context
            .publish(ServiceRole::Primary, Characteristic::Brightness, brightness.value());
        self.context.save_state(&record);
    }
}

impl Accessory for Lightbulb {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::Lightbulb
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        match (service, characteristic) {
            (ServiceRole::Primary, Characteristic::On) => Ok(self.power().is_on().into()),
            (ServiceRole::Primary, Characteristic::Brightness) => {
                Ok(self.brightness().value().into())
            }
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
                self.set_power(value.as_bool(characteristic)?.into());
            }
            (ServiceRole::Primary, Characteristic::Brightness) => {
                self.set_brightness(decode(characteristic, &value)?);
            }
            _ => return unsupported(characteristic),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessoryConfig, LightbulbConfig};
    use crate::event::EventBus;

    #[test]
    fn invalid_brightness_defaults_to_full() {
        let config = AccessoryConfig {
            lightbulb: Some(LightbulbConfig {
                default_state: Some("off".into()),
                brightness: Some(250),
            }),
            ..AccessoryConfig::new("bulb", "Lamp", AccessoryKind::Lightbulb)
        };
        let bulb = Lightbulb::new(AccessoryContext::new(config, None, EventBus::new()));
        assert_eq!(bulb.brightness(), Percentage::FULL);
        assert_eq!(bulb.power(), PowerState::Off);
    }

    #[test]
    fn dimming() {
        let config = AccessoryConfig::new("bulb", "Lamp", AccessoryKind::Lightbulb);
        let bulb = Lightbulb::new(AccessoryContext::new(config, None, EventBus::new()));
        bulb.handle_set(ServiceRole::Primary, Characteristic::Brightness, CharacteristicValue::Int(30))
            .unwrap();
        assert_eq!(
            bulb.handle_get(ServiceRole::Primary, Characteristic::Brightness).unwrap(),
            CharacteristicValue::Int(30)
        );
    }
}
