// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock mechanism.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::Result;
use crate::types::LockState;

use super::{Accessory, AccessoryContext, decode, unsupported};

#[derive(Debug, Serialize, Deserialize)]
struct LockRecord {
    #[serde(rename = "LockState")]
    state: LockState,
}

#[derive(Debug, Clone, Copy)]
struct LockStates {
    current: LockState,
    target: LockState,
}

/// A virtual lock. A target write applies to the current state at once.
#[derive(Debug)]
pub struct Lock {
    context: AccessoryContext,
    states: Mutex<LockStates>,
    hardware_finish: String,
}

impl Lock {
    /// Creates the lock, restoring its stored state if stateful.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Self {
        let config = context.config();
        let state = context
            .load_state::<LockRecord>()
            .map_or_else(|| config.lock_default_state(), |record| record.state);
        let hardware_finish = config.lock_hardware_finish.clone().unwrap_or_default();

        let lock = Self {
            context,
            states: Mutex::new(LockStates {
                current: state,
                target: state,
            }),
            hardware_finish,
        };
        lock.push(state);
        lock
    }

    /// Returns the current lock state.
    #[must_use]
    pub fn current_state(&self) -> LockState {
        self.states.lock().current
    }

    /// Returns the target lock state.
    #[must_use]
    pub fn target_state(&self) -> LockState {
        self.states.lock().target
    }

    /// Locks or unlocks.
    pub fn set_target_state(&self, state: LockState) {
        *self.states.lock() = LockStates {
            current: state,
            target: state,
        };
        tracing::info!(accessory = %self.context.name(), state = %state, "Setting lock state");
        self.push(state);
        self.context.save_state(&LockRecord { state });
    }

    fn push(&self, state: LockState) {
        self.context
            .publish(ServiceRole::Primary, Characteristic::LockTargetState, state.as_num());
        self.context
            .publish(ServiceRole::Primary, Characteristic::LockCurrentState, state.as_num());
    }
}

impl Accessory for Lock {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::Lock
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
            Characteristic::LockCurrentState => Ok(self.current_state().as_num().into()),
            Characteristic::LockTargetState => Ok(self.target_state().as_num().into()),
            Characteristic::HardwareFinish => Ok(self.hardware_finish.as_str().into()),
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
            (ServiceRole::Primary, Characteristic::LockTargetState) => {
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
    use crate::config::AccessoryConfig;
    use crate::event::EventBus;

    fn lock(default: &str) -> Lock {
        let config = AccessoryConfig {
            lock_default_state: Some(default.into()),
            lock_hardware_finish: Some("silver".into()),
            ..AccessoryConfig::new("front", "Front door", AccessoryKind::Lock)
        };
        Lock::new(AccessoryContext::new(config, None, EventBus::new()))
    }

    #[test]
    fn target_applies_immediately() {
        let lock = lock("unlocked");
        assert_eq!(lock.current_state(), LockState::Unsecured);

        lock.handle_set(
            ServiceRole::Primary,
            Characteristic::LockTargetState,
            CharacteristicValue::Int(1),
        )
        .unwrap();
        assert_eq!(lock.current_state(), LockState::Secured);
        assert_eq!(lock.target_state(), LockState::Secured);
    }

    #[test]
    fn rejects_unknown_state_numbers() {
        let lock = lock("locked");
        assert!(
            lock.handle_set(
                ServiceRole::Primary,
                Characteristic::LockTargetState,
                CharacteristicValue::Int(9),
            )
            .is_err()
        );
        assert_eq!(lock.current_state(), LockState::Secured);
    }

    #[test]
    fn exposes_hardware_finish() {
        assert_eq!(
            lock("locked")
                .handle_get(ServiceRole::Primary, Characteristic::HardwareFinish)
                .unwrap(),
            CharacteristicValue::Text("silver".into())
        );
    }
}
