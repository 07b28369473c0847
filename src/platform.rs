// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform: owns every configured accessory and routes host calls.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::accessory::{Accessory, create_accessory};
use crate::characteristic::{Characteristic, CharacteristicValue, ServiceRole};
use crate::config::PlatformConfig;
use crate::error::{Error, Result};
use crate::event::{AccessoryEvent, AccessoryUuid, EventBus};
use crate::storage::{StateStorage, stored_accessory_ids};
use crate::trigger::TriggerEnvironment;

/// Outcome of [`Platform::discover_devices`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Accessories built for the first time.
    pub added: Vec<AccessoryUuid>,
    /// Accessories the host had cached and that are still configured.
    pub restored: Vec<AccessoryUuid>,
    /// Cached accessories that are no longer configured.
    pub removed: Vec<AccessoryUuid>,
    /// Names of configurations that were rejected.
    pub rejected: Vec<String>,
}

/// Owns the accessories built from a [`PlatformConfig`].
///
/// # Examples
///
/// ```no_run
/// use virtual_accessories::config::PlatformConfig;
/// use virtual_accessories::event::EventBus;
/// use virtual_accessories::platform::Platform;
///
/// # async fn example() -> virtual_accessories::Result<()> {
/// let config = PlatformConfig::from_file("config.json")?;
/// let platform = Platform::new(config, EventBus::new());
///
/// let mut events = platform.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("{event:?}");
///     }
/// });
///
/// let report = platform.discover_devices(&[]);
/// println!("{} accessories added", report.added.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Platform {
    config: PlatformConfig,
    events: EventBus,
    environment: TriggerEnvironment,
    accessories: RwLock<HashMap<AccessoryUuid, Arc<dyn Accessory>>>,
}

impl Platform {
    /// Creates a platform. No accessory is built until
    /// [`discover_devices`](Self::discover_devices).
    #[must_use]
    pub fn new(config: PlatformConfig, events: EventBus) -> Self {
        Self {
            config,
            events,
            environment: TriggerEnvironment::default(),
            accessories: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the trigger environment (clock, sun data URL).
    #[must_use]
    pub fn with_environment(mut self, environment: TriggerEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to lifecycle and characteristic events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AccessoryEvent> {
        self.events.subscribe()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Builds every configured accessory.
    ///
    /// `cached` lists the accessories the host restored from its own
    /// cache. Configured accessories found there are reported as restored,
    /// the others as added. Cached accessories that were not built are
    /// unregistered; the state file is deleted only for those no longer
    /// configured at all, so fixing a rejected configuration keeps its
    /// state.
    ///
    /// An invalid configuration is logged and skipped; the others are still
    /// built. A repeated `accessoryID` keeps the first configuration.
    /// Calling this again shuts the current accessories down and rebuilds
    /// them from configuration.
    ///
    /// Must be called within a tokio runtime.
    pub fn discover_devices(&self, cached: &[AccessoryUuid]) -> DiscoveryReport {
        self.shutdown();
        let cached: HashSet<AccessoryUuid> = cached.iter().copied().collect();
        let storage_dir = self.config.storage_path.as_deref();
        let mut report = DiscoveryReport::default();
        let mut built: HashMap<AccessoryUuid, Arc<dyn Accessory>> = HashMap::new();

        for device in &self.config.devices {
            let name = device.name().to_string();
            let uuid = AccessoryUuid::from_accessory_id(device.id());
            if built.contains_key(&uuid) {
                tracing::error!(accessory = %name, id = %device.id(), "Duplicate accessory ID, skipped");
                report.rejected.push(name);
                continue;
            }

            let accessory =
                match create_accessory(device.clone(), storage_dir, &self.events, &self.environment)
                {
                    Ok(accessory) => accessory,
                    Err(e) => {
                        tracing::error!(accessory = %name, error = %e, "Invalid accessory configuration, skipped");
                        report.rejected.push(name);
                        continue;
                    }
                };

            if cached.contains(&uuid) {
                tracing::info!(accessory = %name, "Restoring accessory from cache");
                report.restored.push(uuid);
                self.events
                    .publish(AccessoryEvent::AccessoryRestored { accessory: uuid, name });
            } else {
                tracing::info!(accessory = %name, "Adding new accessory");
                report.added.push(uuid);
                self.events
                    .publish(AccessoryEvent::AccessoryAdded { accessory: uuid, name });
            }
            built.insert(uuid, accessory);
        }

        for uuid in &cached {
            if !built.contains_key(uuid) {
                tracing::info!(accessory = %uuid, "Removing accessory no longer configured");
                report.removed.push(*uuid);
                self.events
                    .publish(AccessoryEvent::AccessoryRemoved { accessory: *uuid });
            }
        }
        if let Some(dir) = &self.config.storage_path {
            let configured: HashSet<AccessoryUuid> = self
                .config
                .devices
                .iter()
                .map(|d| AccessoryUuid::from_accessory_id(d.id()))
                .collect();
            let orphaned: Vec<_> = report
                .removed
                .iter()
                .filter(|uuid| !configured.contains(uuid))
                .copied()
                .collect();
            delete_orphaned_state(dir, &orphaned);
        }

        *self.accessories.write() = built;
        report
    }

    // =========================================================================
    // Host calls
    // =========================================================================

    /// Returns the accessory registered under `uuid`.
    #[must_use]
    pub fn accessory(&self, uuid: AccessoryUuid) -> Option<Arc<dyn Accessory>> {
        self.accessories.read().get(&uuid).cloned()
    }

    /// Returns every registered accessory.
    #[must_use]
    pub fn accessories(&self) -> Vec<Arc<dyn Accessory>> {
        self.accessories.read().values().cloned().collect()
    }

    /// Returns the number of registered accessories.
    #[must_use]
    pub fn accessory_count(&self) -> usize {
        self.accessories.read().len()
    }

    /// Answers a host read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessoryNotFound`] for an unknown accessory, or the
    /// accessory's own error.
    pub fn handle_get(
        &self,
        uuid: AccessoryUuid,
        service: ServiceRole,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        self.accessory(uuid)
            .ok_or(Error::AccessoryNotFound)?
            .handle_get(service, characteristic)
    }

    /// Applies a host write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessoryNotFound`] for an unknown accessory, or the
    /// accessory's own error.
    pub fn handle_set(
        &self,
        uuid: AccessoryUuid,
        service: ServiceRole,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()> {
        self.accessory(uuid)
            .ok_or(Error::AccessoryNotFound)?
            .handle_set(service, characteristic, value)
    }

    /// Cancels every timer, transition and trigger and drops the
    /// accessories.
    pub fn shutdown(&self) {
        let accessories: Vec<_> = self.accessories.write().drain().map(|(_, a)| a).collect();
        for accessory in &accessories {
            accessory.shutdown();
        }
        if !accessories.is_empty() {
            tracing::debug!(count = accessories.len(), "Shut down accessories");
        }
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Deletes the state files of removed accessories.
///
/// Host identities are derived one way from accessory IDs, so the files
/// on disk are matched by re-deriving the identity of each.
fn delete_orphaned_state(dir: &Path, removed: &[AccessoryUuid]) {
    if removed.is_empty() {
        return;
    }
    let ids = match stored_accessory_ids(dir) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Cannot list stored state");
            return;
        }
    };
    for id in ids {
        if removed.contains(&AccessoryUuid::from_accessory_id(&id)) {
            StateStorage::for_accessory(dir, &id).delete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessoryConfig, AccessoryKind};
    use crate::types::PowerState;

    fn switch(id: &str) -> AccessoryConfig {
        AccessoryConfig {
            switch_default_state: Some("off".into()),
            ..AccessoryConfig::new(id, id, AccessoryKind::Switch).stateful()
        }
    }

    #[tokio::test]
    async fn reports_added_and_restored() {
        let config = PlatformConfig::default()
            .with_device(switch("a"))
            .with_device(switch("b"));
        let platform = Platform::new(config, EventBus::new());
        let a = AccessoryUuid::from_accessory_id("a");
        let b = AccessoryUuid::from_accessory_id("b");

        let report = platform.discover_devices(&[a]);
        assert_eq!(report.restored, vec![a]);
        assert_eq!(report.added, vec![b]);
        assert_eq!(platform.accessory_count(), 2);
    }

    #[tokio::test]
    async fn invalid_configuration_is_skipped() {
        let mut broken = switch("broken");
        broken.accessory_type = Some("toaster".into());
        let config = PlatformConfig::default()
            .with_device(broken)
            .with_device(switch("ok"));
        let platform = Platform::new(config, EventBus::new());

        let report = platform.discover_devices(&[]);
        assert_eq!(report.rejected, vec!["broken".to_string()]);
        assert_eq!(platform.accessory_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first() {
        let config = PlatformConfig::default()
            .with_device(switch("a"))
            .with_device(switch("a"));
        let platform = Platform::new(config, EventBus::new());

        let report = platform.discover_devices(&[]);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.rejected.len(), 1);
    }

    #[tokio::test]
    async fn removed_accessory_loses_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let stale = StateStorage::for_accessory(dir.path(), "old");
        stale.save(&serde_json::json!({ "SwitchState": true }));

        let config = PlatformConfig::default()
            .with_storage_path(dir.path())
            .with_device(switch("new"));
        let platform = Platform::new(config, EventBus::new());
        let mut events = platform.subscribe();

        let old = AccessoryUuid::from_accessory_id("old");
        let report = platform.discover_devices(&[old]);

        assert_eq!(report.removed, vec![old]);
        assert!(!stale.exists());
        let mut saw_removal = false;
        while let Ok(event) = events.try_recv() {
            saw_removal |= event == AccessoryEvent::AccessoryRemoved { accessory: old };
        }
        assert!(saw_removal);
    }

    #[tokio::test]
    async fn routes_host_calls() {
        let platform = Platform::new(
            PlatformConfig::default().with_device(switch("s")),
            EventBus::new(),
        );
        platform.discover_devices(&[]);
        let uuid = AccessoryUuid::from_accessory_id("s");

        platform
            .handle_set(uuid, ServiceRole::Primary, Characteristic::On, true.into())
            .unwrap();
        assert_eq!(
            platform
                .handle_get(uuid, ServiceRole::Primary, Characteristic::On)
                .unwrap(),
            CharacteristicValue::from(PowerState::On.is_on())
        );

        let unknown = AccessoryUuid::from_accessory_id("nope");
        assert!(matches!(
            platform.handle_get(unknown, ServiceRole::Primary, Characteristic::On),
            Err(Error::AccessoryNotFound)
        ));

        platform.shutdown();
        assert_eq!(platform.accessory_count(), 0);
    }
}
