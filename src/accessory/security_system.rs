// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::Result;
use crate::types::SecuritySystemState;

use super::{Accessory, AccessoryContext, decode, unsupported};

#[derive(Debug, Serialize, Deserialize)]
struct SecuritySystemRecord {
    #[serde(rename = "SecuritySystemState")]
    state: SecuritySystemState,
}

/// A virtual security system. Arming applies at once.
#[derive(Debug)]
pub struct SecuritySystem {
    context: AccessoryContext,
    state: Mutex<SecuritySystemState>,
}

impl SecuritySystem {
    /// Creates the security system, restoring its stored state if stateful.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Self {
        let default_state = context
            .config()
            .security_system
            .as_ref()
            .map_or(SecuritySystemState::Disarmed, |s| s.default_state());
        let state = context
            .load_state::<SecuritySystemRecord>()
            .map_or(default_state, |record| record.state);

        let system = Self {
            context,
            state: Mutex::new(state),
        };
        system.push(state);
        system
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SecuritySystemState {
        *self.state.lock()
    }

    /// Arms, disarms or raises the alarm.
    pub fn set_target_state(&self, state: SecuritySystemState) {
        *self.state.lock() = state;
        tracing::info!(accessory = %self.context.name(), state = %state, "Setting security system state");
        self.push(state);
        self.context.save_state(&SecuritySystemRecord { state });
    }

    fn push(&self, state: SecuritySystemState) {
        for characteristic in [
            Characteristic::SecuritySystemTargetState,
            Characteristic::SecuritySystemCurrentState,
        ] {
            self.context
                .publish(ServiceRole::Primary, characteristic, state.as_num());
        }
    }
}

impl Accessory for SecuritySystem {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::SecuritySystem
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        match (service, characteristic) {
            (
                ServiceRole::Primary,
                Characteristic::SecuritySystemCurrentState | Characteristic::SecuritySystemTargetState,
            ) => Ok(self.state().as_num().into()),
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
            (ServiceRole::Primary, Characteristic::SecuritySystemTargetState) => {
                self.set_target_state(decode(characteristic, &value)?);
                Ok(())
            }
            _ => unsupported(characteristic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessoryConfig, SecuritySystemConfig};
    use crate::event::EventBus;
    use crate::storage::StateStorage;

    fn config() -> AccessoryConfig {
        AccessoryConfig {
            security_system: Some(SecuritySystemConfig {
                default_state: Some("awayarm".into()),
            }),
            ..AccessoryConfig::new("alarm", "Alarm", AccessoryKind::SecuritySystem)
        }
    }

    #[test]
    fn default_comes_from_security_system_block() {
        let system = SecuritySystem::new(AccessoryContext::new(config(), None, EventBus::new()));
        assert_eq!(system.state(), SecuritySystemState::AwayArm);
    }

    #[test]
    fn arming_persists() {
        let dir = tempfile::tempdir().unwrap();
        let system = SecuritySystem::new(AccessoryContext::new(
            config().stateful(),
            Some(dir.path()),
            EventBus::new(),
        ));
        system
            .handle_set(
                ServiceRole::Primary,
                Characteristic::SecuritySystemTargetState,
                CharacteristicValue::Int(2),
            )
            .unwrap();

        assert_eq!(system.state(), SecuritySystemState::NightArm);
        let stored: serde_json::Value = StateStorage::for_accessory(dir.path(), "alarm").load().unwrap();
        assert_eq!(stored, serde_json::json!({ "SecuritySystemState": 2 }));
    }
}
