// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for virtual accessory state.
//!
//! Every type knows its HomeKit numeric encoding and, where the value can
//! be configured as a default, parses from the configuration string.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off for switches, fans and lightbulbs
//! - [`Percentage`] - Brightness, speed, volume and position (0-100)
//! - [`SensorState`] / [`SensorKind`] - Two-valued sensors
//! - [`DoorState`] - Garage door states
//! - [`LockState`] - Lock mechanism states
//! - [`ValveType`] / [`ValveActive`] / [`ValveInUse`] - Valves
//! - [`PositionState`] / [`CoveringDefault`] - Window coverings
//! - [`SecuritySystemState`] - Security system arming
//! - [`RotationDirection`] - Fans
//! - [`TimeUnit`] - Reset timer units

mod covering;
mod door;
mod duration;
mod fan;
mod lock;
mod percentage;
mod power;
mod security;
mod sensor;
mod valve;

pub use covering::{CoveringDefault, PositionState};
pub use door::DoorState;
pub use duration::TimeUnit;
pub use fan::RotationDirection;
pub use lock::LockState;
pub use percentage::Percentage;
pub use power::PowerState;
pub use security::SecuritySystemState;
pub use sensor::{SensorKind, SensorState, determine_sensor_state};
pub use valve::{ValveActive, ValveInUse, ValveType};
