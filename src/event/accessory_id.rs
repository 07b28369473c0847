// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for identifiers derived from configured accessory IDs.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x5f1c_9a3e_2b7d_4e08_a1c6_73d2_e94b_0f17);

/// Stable identifier of a virtual accessory.
///
/// Derived deterministically (UUID v5) from the `accessoryID` the user
/// configured, so the same accessory keeps its identity across restarts
/// and configuration reloads. Ownership checks between accessories,
/// companions and triggers compare these identifiers.
///
/// # Examples
///
/// ```
/// use virtual_accessories::event::AccessoryUuid;
///
/// let a = AccessoryUuid::from_accessory_id("porch-switch");
/// let b = AccessoryUuid::from_accessory_id("porch-switch");
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessoryUuid(Uuid);

impl AccessoryUuid {
    /// Derives the identifier for a configured accessory ID.
    #[must_use]
    pub fn from_accessory_id(accessory_id: &str) -> Self {
        Self(Uuid::new_v5(&ACCESSORY_NAMESPACE, accessory_id.as_bytes()))
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AccessoryUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "AccessoryUuid({short}...)")
    }
}

impl fmt::Display for AccessoryUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AccessoryUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ids_are_stable() {
        assert_eq!(
            AccessoryUuid::from_accessory_id("a"),
            AccessoryUuid::from_accessory_id("a")
        );
    }

    #[test]
    fn different_ids_differ() {
        assert_ne!(
            AccessoryUuid::from_accessory_id("a"),
            AccessoryUuid::from_accessory_id("b")
        );
    }

    #[test]
    fn debug_format() {
        let debug = format!("{:?}", AccessoryUuid::from_accessory_id("x"));
        assert!(debug.starts_with("AccessoryUuid("));
        assert!(debug.ends_with("...)"));
    }

    #[test]
    fn hashable() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let id = AccessoryUuid::from_accessory_id("lamp");
        set.insert(id);
        assert!(set.contains(&id));
    }
}
