// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Virtual Accessories - state engines for virtual smart-home accessories.
//!
//! This library implements the behavior behind virtual switches, locks,
//! sensors and other accessories that exist only in software: their state
//! machines, auto-reset timers, companion sensors and the triggers that
//! drive sensors from the outside world.
//!
//! # Supported Accessories
//!
//! - **Switch**: default state, auto-reset timer, companion sensor
//! - **Lightbulb** and **Fan**: power, brightness, speed and direction
//! - **Lock**, **Security system**, **Garage door**, **Window covering**
//! - **Valve**: run duration with automatic shut-off
//! - **Doorbell**: programmable switch event, optional companion switch
//! - **Sensor**: ten two-valued kinds, optionally driven by a trigger
//!
//! # Triggers
//!
//! - **Ping** (feature `ping`): reachability of a host over ICMP
//! - **Cron**: five-field cron pattern within an optional window
//! - **Sun events** (feature `sunevents`): sunrise, sunset, golden hour
//!
//! # Quick Start
//!
//! ```no_run
//! use virtual_accessories::config::PlatformConfig;
//! use virtual_accessories::event::{AccessoryEvent, EventBus};
//! use virtual_accessories::platform::Platform;
//!
//! #[tokio::main]
//! async fn main() -> virtual_accessories::Result<()> {
//!     let config = PlatformConfig::from_json(
//!         r#"{
//!             "storagePath": "/var/lib/virtual-accessories",
//!             "devices": [{
//!                 "accessoryID": "porch",
//!                 "accessoryName": "Porch Light",
//!                 "accessoryType": "switch",
//!                 "accessoryIsStateful": true,
//!                 "switchDefaultState": "off"
//!             }]
//!         }"#,
//!     )?;
//!
//!     let platform = Platform::new(config, EventBus::new());
//!     let mut events = platform.subscribe();
//!     platform.discover_devices(&[]);
//!
//!     while let Ok(event) = events.recv().await {
//!         if let AccessoryEvent::CharacteristicChanged { characteristic, value, .. } = event {
//!             println!("{characteristic} = {value:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod accessory;
pub mod characteristic;
pub mod config;
pub mod error;
pub mod event;
pub mod platform;
pub mod protocol;
pub mod schedule;
pub mod storage;
pub mod timer;
pub mod trigger;
pub mod types;

pub use accessory::{Accessory, AccessoryContext, create_accessory};
pub use characteristic::{Characteristic, CharacteristicValue, ServiceRole};
pub use config::{AccessoryConfig, AccessoryKind, PlatformConfig};
pub use error::{ConfigError, Error, OwnershipError, ProtocolError, Result, ValueError};
pub use event::{AccessoryEvent, AccessoryUuid, EventBus};
pub use platform::{DiscoveryReport, Platform};
pub use timer::DurationTimer;
pub use trigger::{Trigger, TriggerEnvironment};
