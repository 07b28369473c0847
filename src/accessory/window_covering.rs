// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window covering with a configurable travel time.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::AccessoryKind;
use crate::error::Result;
use crate::timer::DurationTimer;
use crate::types::{Percentage, PositionState, TimeUnit};

use super::{Accessory, AccessoryContext, decode, unsupported};

#[derive(Debug, Serialize, Deserialize)]
struct WindowCoveringRecord {
    #[serde(rename = "WindowCoveringPosition")]
    position: Percentage,
}

#[derive(Debug, Clone, Copy)]
struct CoveringStates {
    current: Percentage,
    target: Percentage,
    movement: PositionState,
}

/// A virtual blind or shade.
#[derive(Debug)]
pub struct WindowCovering {
    context: AccessoryContext,
    this: Weak<Self>,
    states: Mutex<CoveringStates>,
    travel: DurationTimer,
}

impl WindowCovering {
    /// Creates the covering, restoring its stored position if stateful.
    #[must_use]
    pub fn new(context: AccessoryContext) -> Arc<Self> {
        let config = context.config();
        let position = context
            .load_state::<WindowCoveringRecord>()
            .map_or_else(|| config.window_covering_default_position(), |r| r.position);
        let travel = DurationTimer::new(format!("{} travel", context.name()), true)
            .with_duration(config.transition_duration_secs(), TimeUnit::Seconds);

        let covering = Arc::new_cyclic(|this| Self {
            context,
            this: this.clone(),
            states: Mutex::new(CoveringStates {
                current: position,
                target: position,
                movement: PositionState::Stopped,
            }),
            travel,
        });
        covering.push(Characteristic::TargetPosition, position.value());
        covering.push(Characteristic::CurrentPosition, position.value());
        covering.push(Characteristic::PositionState, PositionState::Stopped.as_num());
        covering
    }

    /// Returns the current position.
    #[must_use]
    pub fn current_position(&self) -> Percentage {
        self.states.lock().current
    }

    /// Returns the target position.
    #[must_use]
    pub fn target_position(&self) -> Percentage {
        self.states.lock().target
    }

    /// Returns the direction of travel.
    #[must_use]
    pub fn position_state(&self) -> PositionState {
        self.states.lock().movement
    }

    /// Starts moving towards `target`.
    ///
    /// With a zero travel time the covering arrives immediately.
    pub fn set_target_position(&self, target: Percentage) {
        let movement = {
            let mut states = self.states.lock();
            let movement = PositionState::between(states.current, target);
            states.target = target;
            states.movement = movement;
            movement
        };
        tracing::info!(
            accessory = %self.context.name(),
            target = %target,
            movement = %movement,
            "Setting window covering position"
        );
        self.push(Characteristic::TargetPosition, target.value());
        self.push(Characteristic::PositionState, movement.as_num());

        if self.travel.duration_secs() == 0 {
            self.finish_travel();
            return;
        }
        let this = self.this.clone();
        self.travel.start(move || {
            if let Some(covering) = this.upgrade() {
                covering.finish_travel();
            }
        });
    }

    fn finish_travel(&self) {
        let position = {
            let mut states = self.states.lock();
            states.current = states.target;
            states.movement = PositionState::Stopped;
            states.current
        };
        tracing::info!(accessory = %self.context.name(), position = %position, "Window covering stopped");
        self.push(Characteristic::CurrentPosition, position.value());
        self.push(Characteristic::PositionState, PositionState::Stopped.as_num());
        self.context.save_state(&WindowCoveringRecord { position });
    }

    fn push(&self, characteristic: Characteristic, value: u8) {
        self.context.publish(ServiceRole::Primary, characteristic, value);
    }
}

impl Accessory for WindowCovering {
    fn context(&self) -> &AccessoryContext {
        &self.context
    }

    fn kind(&self) -> AccessoryKind {
        AccessoryKind::WindowCovering
    }

    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        if service != ServiceRole::Primary {
            return unsupported(characteristic);
        }
        let states = *self.states.lock();
        match characteristic {
            Characteristic::CurrentPosition => Ok(states.current.value().into()),
            Characteristic::TargetPosition => Ok(states.target.value().into()),
            Characteristic::PositionState => Ok(states.movement.as_num().into()),
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
            (ServiceRole::Primary, Characteristic::TargetPosition) => {
                self.set_target_position(decode(characteristic, &value)?);
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

    fn covering(transition: i64) -> Arc<WindowCovering> {
        let config = AccessoryConfig {
            window_covering_default_state: Some("closed".into()),
            transition_duration: Some(transition),
            ..AccessoryConfig::new("blind", "Blind", AccessoryKind::WindowCovering)
        };
        WindowCovering::new(AccessoryContext::new(config, None, EventBus::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn travels_then_stops() {
        let blind = covering(10);
        blind.set_target_position(Percentage::FULL);
        assert_eq!(blind.position_state(), PositionState::Increasing);
        assert_eq!(blind.current_position(), Percentage::ZERO);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(blind.position_state(), PositionState::Stopped);
        assert_eq!(blind.current_position(), Percentage::FULL);
    }

    #[tokio::test]
    async fn zero_travel_is_immediate() {
        let blind = covering(0);
        blind.set_target_position(Percentage::new(40).unwrap());
        assert_eq!(blind.current_position().value(), 40);
        assert_eq!(blind.position_state(), PositionState::Stopped);
    }
}
