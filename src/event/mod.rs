// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for pushing accessory updates to the host.
//!
//! Every state change an accessory makes, whether requested by the host
//! or caused by a timer or trigger, is published on the [`EventBus`] as an
//! [`AccessoryEvent::CharacteristicChanged`]. The host adapter subscribes
//! and forwards the values to its own characteristic layer.
//!
//! # Examples
//!
//! ```
//! use virtual_accessories::event::{AccessoryEvent, AccessoryUuid, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let accessory = AccessoryUuid::from_accessory_id("switch-1");
//! bus.publish(AccessoryEvent::AccessoryRemoved { accessory });
//! ```

mod accessory_event;
mod accessory_id;
mod event_bus;

pub use accessory_event::AccessoryEvent;
pub use accessory_id::AccessoryUuid;
pub use event_bus::EventBus;
