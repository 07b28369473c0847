// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Garage door opener with a fixed travel time.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::{Error, Result};
use crate::timer::DurationTimer;
use crate::types::{DoorState, TimeUnit};

use super::{Accessory, AccessoryContext, decode, unsupported};

/// Seconds a door takes to open or close.
pub const GARAGE_DOOR_TRAVEL_SECS: u64 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct GarageDoorRecord {
    #[serde(rename = "GarageDoorState")]
    state: DoorState,
}

#[derive(Debug, Clone, Copy)]
struct DoorStates {
    current: DoorState,
    target: DoorState,
}

/// A virtual garage door.
///
/// A target write shows `Opening`/`Closing` right away and settles on the
/// target after [`GARAGE_DOOR_TRAVEL_SECS`]. A new target replaces a
/// travel in progress.
#[derive(Debug)]
pub struct GarageDoor {
    context: AccessoryContext,
    this: Weak<Self>,
    states: Mutex<DoorStates>,
    travel: DurationTimer,
}

impl GarageDoor {
    /// Creates the door, restoring its stored state if stateful.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Arc<Self> {
        let state = context
            .load_state::<GarageDoorRecord>()
            .map_or_else(|| context.config().garage_door_default_state(), |r| r.state);
        let travel = DurationTimer::new(format!("{} travel", context.name()), true)
            .with_duration(GARAGE_DOOR_TRAVEL_SECS, TimeUnit::Seconds);

        let door = Arc::new_cyclic(|this| Self {
            context,
            this: this.clone(),
            states: Mutex::new(DoorStates {
                current: state,
                target: state,
            }),
            travel,
        });
        door.push(Characteristic::TargetDoorState, state);
        door.push(Characteristic::CurrentDoorState, state);
        door.context
            .publish(ServiceRole::Primary, Characteristic::ObstructionDetected, false);
        door
    }

    /// Returns the current door state.
    #[must_use]
    pub fn current_state(&self) -> DoorState {
        self.states.lock().current
    }

    /// Returns the target door state.
    #[must_use]
    pub fn target_state(&self) -> DoorState {
        self.states.lock().target
    }

    /// Starts moving the door towards `target`.
    pub fn set_target_state(&self, target: DoorState) {
        let moving = target.transition_towards();
        *self.states.lock() = DoorStates {
            current: moving,
            target,
        };
        tracing::info!(accessory = %self.context.name(), state = %moving, "Setting garage door state");
        self.push(Characteristic::TargetDoorState, target);
        self.push(Characteristic::CurrentDoorState, moving);

        let this = self.this.clone();
        self.travel.start(move || {
            if let Some(door) = this.upgrade() {
                door.finish_travel();
            }
        });
    }

    fn finish_travel(&self) {
        let target = {
            let mut states = self.states.lock();
            states.current = states.target;
            states.target
        };
        tracing::info!(accessory = %self.context.name(), state = %target, "Setting garage door state");
        self.push(Characteristic::CurrentDoorState, target);
        self.context.save_state(&GarageDoorRecord { state: target });
    }

    fn push(&self, characteristic: Characteristic, state: DoorState) {
        self.context
            .publish(ServiceRole::Primary, characteristic, state.as_num());
    }
}

impl Accessory for GarageDoor {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::GarageDoor
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
            Characteristic::CurrentDoorState => Ok(self.current_state().as_num().into()),
            Characteristic::TargetDoorState => Ok(self.target_state().as_num().into()),
            Characteristic::ObstructionDetected => Ok(false.into()),
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
            (ServiceRole::Primary, Characteristic::TargetDoorState) => {
                let target: DoorState = decode(characteristic, &value)?;
                if !matches!(target, DoorState::Open | DoorState::Closed) {
                    return Err(Error::InvalidValue {
                        characteristic,
                        message: format!("{target} is not a target door state"),
                    });
                }
                self.set_target_state(target);
                Ok(())
            }
            _ => unsupported(characteristic),
        }
    }

    fn shutdown(&self) {
        self.travel.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::AccessoryConfig;
    use crate::event::EventBus;
    use crate::storage::StateStorage;

    fn config() -> AccessoryConfig {
        AccessoryConfig {
            garage_door_default_state: Some("closed".into()),
            ..AccessoryConfig::new("gd", "Garage", AccessoryKind::GarageDoor)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_travel_time() {
        let dir = tempfile::tempdir().unwrap();
        let door = GarageDoor::new(AccessoryContext::new(config().stateful(), Some(dir.path()), EventBus::new()));
        assert_eq!(door.current_state(), DoorState::Closed);

        door.set_target_state(DoorState::Open);
        assert_eq!(door.current_state(), DoorState::Opening);
        assert_eq!(door.target_state(), DoorState::Open);

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(door.current_state(), DoorState::Open);

        let stored: serde_json::Value = StateStorage::for_accessory(dir.path(), "gd").load().unwrap();
        assert_eq!(stored, serde_json::json!({ "GarageDoorState": 0 }));
    }

    #[tokio::test(start_paused = true)]
    async fn new_target_replaces_travel() {
        let door = GarageDoor::new(AccessoryContext::new(config(), None, EventBus::new()));

        door.set_target_state(DoorState::Open);
        tokio::time::sleep(Duration::from_secs(2)).await;
        door.set_target_state(DoorState::Closed);
        assert_eq!(door.current_state(), DoorState::Closing);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(door.current_state(), DoorState::Closing);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(door.current_state(), DoorState::Closed);
    }

    #[tokio::test]
    async fn transitional_targets_are_rejected() {
        let door = GarageDoor::new(AccessoryContext::new(config(), None, EventBus::new()));
        assert!(
            door.handle_set(ServiceRole::Primary, Characteristic::TargetDoorState, CharacteristicValue::Int(2))
                .is_err()
        );
        assert_eq!(door.target_state(), DoorState::Closed);
    }
}
