// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Doorbell with an optional companion switch that rings it.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::{OwnershipError, Result};
use crate::event::AccessoryUuid;
use crate::timer::DurationTimer;
use crate::types::{Percentage, PowerState, TimeUnit};

use super::{Accessory, AccessoryContext, decode, unsupported};

/// `ProgrammableSwitchEvent` value of a single press.
pub const SINGLE_PRESS: u8 = 0;

/// Seconds before the companion switch turns itself off.
const COMPANION_SWITCH_RESET_SECS: u64 = 1;

#[derive(Debug)]
struct CompanionSwitch {
    name: String,
    owner: AccessoryUuid,
    state: Mutex<PowerState>,
    reset: DurationTimer,
}

/// A virtual doorbell.
#[derive(Debug)]
pub struct Doorbell {
    context: AccessoryContext,
    this: Weak<Self>,
    volume: Mutex<Percentage>,
    companion: Option<CompanionSwitch>,
}

impl Doorbell {
    /// Creates the doorbell and its companion switch, if configured.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Arc<Self> {
        let config = context.config();
        let volume = config.doorbell_volume();
        let companion = config.accessory_has_companion_switch.then(|| {
            let name = config
                .companion_switch
                .as_ref()
                .and_then(|s| s.name.clone())
                .unwrap_or_else(|| format!("{} Switch", context.name()));
            CompanionSwitch {
                reset: DurationTimer::new(format!("{name} reset"), true)
                    .with_duration(COMPANION_SWITCH_RESET_SECS, TimeUnit::Seconds),
                name,
                owner: context.uuid(),
                state: Mutex::new(PowerState::Off),
            }
        });

        let doorbell = Arc::new_cyclic(|this| Self {
            context,
            this: this.clone(),
            volume: Mutex::new(volume),
            companion,
        });
        doorbell
            .context
            .publish(ServiceRole::Primary, Characteristic::Volume, volume.value());
        if doorbell.companion.is_some() {
            doorbell
                .context
                .publish(ServiceRole::CompanionSwitch, Characteristic::On, false);
        }
        doorbell
    }

    /// Returns the volume.
    #[must_use]
    pub fn volume(&self) -> Percentage {
        *self.volume.lock()
    }

    /// Returns the companion switch state, if there is one.
    #[must_use]
    pub fn companion_switch_state(&self) -> Option<PowerState> {
        self.companion.as_ref().map(|s| *s.state.lock())
    }

    /// Sets the volume.
    pub fn set_volume(&self, volume: Percentage) {
        *self.volume.lock() = volume;
        tracing::info!(accessory = %self.context.name(), volume = %volume, "Setting doorbell volume");
        self.context
            .publish(ServiceRole::Primary, Characteristic::Volume, volume.value());
    }

    /// Pushes a single press to the host on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError::AccessoryNotAllowed`] if `caller` is not
    /// this doorbell.
    pub fn ring(&self, caller: &AccessoryUuid) -> std::result::Result<(), OwnershipError> {
        if *caller != self.context.uuid() {
            return Err(OwnershipError::AccessoryNotAllowed {
                caller: caller.to_string(),
                sensor: self.context.name().to_string(),
            });
        }
        tracing::info!(accessory = %self.context.name(), "Ringing doorbell");
        self.context.publish(
            ServiceRole::Primary,
            Characteristic::ProgrammableSwitchEvent,
            SINGLE_PRESS,
        );
        Ok(())
    }

    fn set_companion_switch(
        &self,
        companion: &CompanionSwitch,
        state: PowerState,
    ) -> std::result::Result<(), OwnershipError> {
        *companion.state.lock() = state;
        tracing::info!(switch = %companion.name, state = %state, "Setting doorbell switch state");
        self.context
            .publish(ServiceRole::CompanionSwitch, Characteristic::On, state.is_on());

        if state.is_on() {
            self.ring(&companion.owner)?;
            let this = self.this.clone();
            companion.reset.start(move || {
                if let Some(doorbell) = this.upgrade() {
                    if let Some(companion) = &doorbell.companion {
                        if let Err(e) = doorbell.set_companion_switch(companion, PowerState::Off) {
                            tracing::error!(error = %e, "Failed to reset doorbell switch");
                        }
                    }
                }
            });
        } else {
            companion.reset.stop();
        }
        Ok(())
    }
}

impl Accessory for Doorbell {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::Doorbell
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        match (service, characteristic) {
            (ServiceRole::Primary, Characteristic::ProgrammableSwitchEvent) => {
                Ok(SINGLE_PRESS.into())
            }
            (ServiceRole::Primary, Characteristic::Volume) => Ok(self.volume().value().into()),
            (ServiceRole::CompanionSwitch, Characteristic::On) => self
                .companion_switch_state()
                .map_or_else(|| unsupported(characteristic), |s| Ok(s.is_on().into())),
            _ => unsupported(characteristic),
        }
    }

    fn handle_set(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()> {
        match (service, characteristic, &self.companion) {
            (ServiceRole::Primary, Characteristic::Volume, _) => {
                self.set_volume(decode(characteristic, &value)?);
                Ok(())
            }
            (ServiceRole::CompanionSwitch, Characteristic::On, Some(companion)) => {
                let on = value.as_bool(characteristic)?;
                Ok(self.set_companion_switch(companion, on.into())?)
            }
            _ => unsupported(characteristic),
        }
    }

    fn shutdown(&self) {
        if let Some(companion) = &self.companion {
            companion.reset.stop();
        }
    }
}
