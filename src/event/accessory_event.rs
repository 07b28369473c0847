// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory event types.

use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};

use super::AccessoryUuid;

/// Events pushed to the host.
///
/// `CharacteristicChanged` is the push-style update every state change
/// produces; the lifecycle events come from the platform.
///
/// # Examples
///
/// ```
/// use virtual_accessories::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
/// use virtual_accessories::event::{AccessoryEvent, AccessoryUuid};
///
/// let accessory = AccessoryUuid::from_accessory_id("lamp");
/// let event = AccessoryEvent::characteristic_changed(
///     accessory,
///     ServiceRole::Primary,
///     Characteristic::On,
///     true,
/// );
/// assert!(event.is_characteristic_change());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessoryEvent {
    /// A configured accessory was built for the first time.
    AccessoryAdded {
        /// The new accessory.
        accessory: AccessoryUuid,
        /// Its display name.
        name: String,
    },

    /// A cached accessory was rebuilt from configuration.
    AccessoryRestored {
        /// The restored accessory.
        accessory: AccessoryUuid,
        /// Its display name.
        name: String,
    },

    /// An accessory is no longer configured and was torn down.
    AccessoryRemoved {
        /// The removed accessory.
        accessory: AccessoryUuid,
    },

    /// A characteristic value changed.
    CharacteristicChanged {
        /// The owning accessory.
        accessory: AccessoryUuid,
        /// The service carrying the characteristic.
        service: ServiceRole,
        /// The characteristic.
        characteristic: Characteristic,
        /// The new value.
        value: CharacteristicValue,
    },
}

impl AccessoryEvent {
    /// Creates a characteristic change event.
    #[must_use]
    pub fn characteristic_changed(
        accessory: AccessoryUuid,
        service: ServiceRole,
        characteristic: Characteristic,
        value: impl Into<CharacteristicValue>,
    ) -> Self {
        Self::CharacteristicChanged {
            accessory,
            service,
            characteristic,
            value: value.into(),
        }
    }

    /// Returns the accessory this event concerns.
    #[must_use]
    pub fn accessory(&self) -> AccessoryUuid {
        match self {
            Self::AccessoryAdded { accessory, .. }
            | Self::AccessoryRestored { accessory, .. }
            | Self::AccessoryRemoved { accessory }
            | Self::CharacteristicChanged { accessory, .. } => *accessory,
        }
    }

    /// Returns `true` for lifecycle events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        !self.is_characteristic_change()
    }

    /// Returns `true` for characteristic changes.
    #[must_use]
    pub fn is_characteristic_change(&self) -> bool {
        matches!(self, Self::CharacteristicChanged { .. })
    }
}
