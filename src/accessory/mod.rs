// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Virtual accessories.
//!
//! Each configured accessory becomes one [`Accessory`] object that owns
//! its state, answers host reads and writes through
//! [`handle_get`](Accessory::handle_get) and
//! [`handle_set`](Accessory::handle_set), and pushes every change it makes
//! on its own (timers, transitions, triggers) to the [`EventBus`].
//!
//! Construction follows the same protocol for every kind: compute the
//! default from configuration, adopt the stored state instead if the
//! accessory is stateful and a complete record exists, otherwise delete
//! any leftover state file.

mod doorbell;
mod fan;
mod garage_door;
mod lightbulb;
mod lock;
mod reset_timer;
mod security_system;
mod sensor;
mod switch;
mod valve;
mod window_covering;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::{AccessoryConfig, AccessoryKind};
use crate::error::{ConfigError, Error, Result};
use crate::event::{AccessoryEvent, AccessoryUuid, EventBus};
use crate::storage::StateStorage;
use crate::trigger::TriggerEnvironment;

pub use doorbell::Doorbell;
pub use fan::Fan;
pub use garage_door::GarageDoor;
pub use lightbulb::Lightbulb;
pub use lock::Lock;
pub use security_system::SecuritySystem;
pub use sensor::{SensorAccessory, VirtualSensor};
pub use switch::Switch;
pub use valve::Valve;
pub use window_covering::WindowCovering;

/// A virtual accessory as seen by the host.
pub trait Accessory: Send + Sync + fmt::Debug {
    /// Returns the shared accessory context.
    fn context(&self) -> &AccessoryContext;

    /// Returns the accessory kind.
    fn kind(&self) -> AccessoryKind;

    /// Answers a host read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCharacteristic`] if the service does not
    /// expose `characteristic`.
    fn handle_get(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue>;

    /// Applies a host write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCharacteristic`] if the characteristic is
    /// not writable, [`Error::InvalidValue`] if the value has the wrong type
    /// or range, or an ownership error raised by a companion service.
    fn handle_set(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()>;

    /// Cancels every pending timer, transition and trigger.
    fn shutdown(&self) {}

    /// Returns the host identity of the accessory.
    fn uuid(&self) -> AccessoryUuid {
        self.context().uuid()
    }

    /// Returns the display name.
    fn name(&self) -> &str {
        self.context().name()
    }
}

/// State shared by every accessory kind: configuration, identity,
/// storage slot and event bus.
#[derive(Debug)]
pub struct AccessoryContext {
    config: AccessoryConfig,
    uuid: AccessoryUuid,
    storage: Option<StateStorage>,
    events: EventBus,
}

impl AccessoryContext {
    /// Creates the context and applies the storage policy.
    ///
    /// A stateless accessory deletes any state file left from an earlier
    /// stateful configuration.
    #[must_use]
    pub fn new(config: AccessoryConfig, storage_dir: Option<&Path>, events: EventBus) -> Self {
        let uuid = AccessoryUuid::from_accessory_id(config.id());
        let storage = storage_dir.map(|dir| StateStorage::for_accessory(dir, config.id()));

        if config.accessory_is_stateful {
            if storage.is_none() {
                tracing::warn!(
                    accessory = %config.name(),
                    "Stateful accessory without storage path, state will not persist"
                );
            }
        } else if let Some(storage) = &storage {
            storage.delete();
        }

        Self {
            config,
            uuid,
            storage,
            events,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AccessoryConfig {
        &self.config
    }

    /// Returns the host identity.
    #[must_use]
    pub fn uuid(&self) -> AccessoryUuid {
        self.uuid
    }

    /// Returns the configured `accessoryID`.
    #[must_use]
    pub fn id(&self) -> &str {
        self.config.id()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// Returns the storage slot, if a storage directory was given.
    #[must_use]
    pub fn storage(&self) -> Option<&StateStorage> {
        self.storage.as_ref()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns `true` if state survives restarts.
    #[must_use]
    pub fn is_stateful(&self) -> bool {
        self.config.accessory_is_stateful
    }

    /// Loads the stored record of a stateful accessory.
    pub(crate) fn load_state<T: DeserializeOwned>(&self) -> Option<T> {
        if !self.is_stateful() {
            return None;
        }
        self.storage.as_ref()?.load()
    }

    /// Persists the record of a stateful accessory.
    pub(crate) fn save_state<T: Serialize>(&self, record: &T) {
        if !self.is_stateful() {
            return;
        }
        if let Some(storage) = &self.storage {
            storage.save(record);
        }
    }

    /// Pushes a characteristic value to the host.
    pub(crate) fn publish(
        &self,
        service: ServiceRole,
        characteristic: Characteristic,
        value: impl Into<CharacteristicValue>,
    ) {
        self.events.publish(AccessoryEvent::characteristic_changed(
            self.uuid,
            service,
            characteristic,
            value,
        ));
    }
}

/// Builds the accessory described by `config`.
///
/// The configuration is validated first; an invalid configuration never
/// produces an accessory. Sensors arm their trigger, if any, which
/// requires a running tokio runtime.
///
/// # Errors
///
/// Returns a [`ConfigError`] when validation fails.
pub fn create_accessory(
    config: AccessoryConfig,
    storage_dir: Option<&Path>,
    events: &EventBus,
    environment: &TriggerEnvironment,
) -> std::result::Result<Arc<dyn Accessory>, ConfigError> {
    let kind = config.validate()?;
    let context = AccessoryContext::new(config, storage_dir, events.clone());

    let accessory: Arc<dyn Accessory> = match kind {
        AccessoryKind::Doorbell => Doorbell::new(context),
        AccessoryKind::Fan => Arc::new(Fan::new(context)),
        AccessoryKind::GarageDoor => GarageDoor::new(context),
        AccessoryKind::Lightbulb => Arc::new(Lightbulb::new(context)),
        AccessoryKind::Lock => Arc::new(Lock::new(context)),
        AccessoryKind::SecuritySystem => Arc::new(SecuritySystem::new(context)),
        AccessoryKind::Sensor => SensorAccessory::new(context, environment)?,
        AccessoryKind::Switch => Switch::new(context)?,
        AccessoryKind::Valve => Valve::new(context),
        AccessoryKind::WindowCovering => WindowCovering::new(context),
    };

    tracing::debug!(accessory = %accessory.name(), kind = %kind, "Created accessory");
    Ok(accessory)
}

/// Error for a characteristic the service does not expose.
pub(crate) fn unsupported<T>(characteristic: Characteristic) -> Result<T> {
    Err(Error::UnsupportedCharacteristic(characteristic))
}

/// Decodes a numeric host value into a typed state.
pub(crate) fn decode<T>(characteristic: Characteristic, value: &CharacteristicValue) -> Result<T>
where
    T: TryFrom<u8, Error = crate::error::ValueError>,
{
    let raw = value.as_int(characteristic)?;
    let byte = u8::try_from(raw).map_err(|_| Error::InvalidValue {
        characteristic,
        message: format!("{raw} does not fit a state value"),
    })?;
    Ok(T::try_from(byte)?)
}
