// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of managed robots.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::protocol::VacuumApi;
use crate::sink::AttributeSink;
use crate::sync::{DeviceCommand, Synchronizer, spawn_device_task, startup_delay};
use crate::telemetry::RobotIdentity;

use super::managed_device::{AddOutcome, ManagedDevice};

/// Registry coordinating every robot of one bridge.
///
/// Each added robot is identified, registered with the sink and handed to its
/// own polling task. Robots are keyed by their vendor system id, so adding a
/// known robot from a new address only updates the address.
///
/// # Examples
///
/// ```no_run
/// # #[cfg(feature = "http")]
/// # async fn example<S: valetudo_bridge::sink::AttributeSink>(sink: S) -> valetudo_bridge::Result<()> {
/// use valetudo_bridge::{BridgeConfig, DeviceCommand, DeviceRegistry};
///
/// let registry = DeviceRegistry::new(sink, BridgeConfig::default());
///
/// let mut events = registry.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("Event: {event:?}");
///     }
/// });
///
/// let outcome = registry.add_address("192.168.1.40").await?;
/// registry
///     .send_command(outcome.device_id(), DeviceCommand::GoHome)
///     .await?;
///
/// registry.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct DeviceRegistry<A: VacuumApi, S: AttributeSink> {
    /// Managed robots, keyed by device ID.
    devices: RwLock<HashMap<DeviceId, ManagedDevice<A>>>,
    /// Downstream attribute sink.
    sink: Arc<S>,
    /// Event bus for broadcasting device events.
    event_bus: EventBus,
    config: Arc<BridgeConfig>,
    /// Per-identity locks held while a new robot is set up.
    setup_locks: parking_lot::Mutex<HashMap<DeviceId, Arc<Mutex<()>>>>,
}

impl<A: VacuumApi, S: AttributeSink> std::fmt::Debug for DeviceRegistry<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<A: VacuumApi, S: AttributeSink> DeviceRegistry<A, S> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(sink: S, config: BridgeConfig) -> Self {
        Self::with_event_bus(sink, config, EventBus::new())
    }

    /// Creates an empty registry publishing to an existing event bus.
    #[must_use]
    pub fn with_event_bus(sink: S, config: BridgeConfig, event_bus: EventBus) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            sink: Arc::new(sink),
            event_bus,
            config: Arc::new(config),
            setup_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Returns the bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the attribute sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to device events of every managed robot.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the number of active event subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.event_bus.subscriber_count()
    }

    // =========================================================================
    // Device Management
    // =========================================================================

    /// Adds a robot reachable through `api`.
    ///
    /// The robot is identified first. A robot already in the registry keeps
    /// its task and record; only its address is updated. A new robot is
    /// registered with the sink and its first poll is scheduled after the
    /// startup delay, staggered by the number of robots already managed.
    /// Concurrent adds of the same robot are set up once; the later ones
    /// only update the address.
    ///
    /// # Errors
    ///
    /// Returns an error if the robot cannot be identified, its capabilities
    /// cannot be loaded, the sink rejects the registration, or the new
    /// address is unusable.
    pub async fn add_device(&self, api: A) -> Result<AddOutcome> {
        let identity = api.fetch_identity().await?;
        let device_id = DeviceId::new(&identity.system_id);

        if let Some(device) = self.devices.read().await.get(&device_id) {
            return self.update_address(&device_id, device, &api.address());
        }

        let setup = Arc::clone(self.setup_locks.lock().entry(device_id.clone()).or_default());
        let guard = setup.lock().await;
        let result = self.set_up(device_id.clone(), identity, api).await;
        drop(guard);

        let mut locks = self.setup_locks.lock();
        // One reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&setup) <= 2 {
            locks.remove(&device_id);
        }
        drop(locks);

        result
    }

    async fn set_up(
        &self,
        device_id: DeviceId,
        identity: RobotIdentity,
        api: A,
    ) -> Result<AddOutcome> {
        if let Some(device) = self.devices.read().await.get(&device_id) {
            tracing::debug!(device = %device_id, "Device registered concurrently");
            return self.update_address(&device_id, device, &api.address());
        }

        let api = Arc::new(api);
        let sync = Synchronizer::initialize(
            Arc::clone(&api),
            Arc::clone(&self.sink),
            self.event_bus.clone(),
            Arc::clone(&self.config),
            identity,
        )
        .await?;

        let mut devices = self.devices.write().await;
        let order = u32::try_from(devices.len()).unwrap_or(u32::MAX);
        let handle = spawn_device_task(sync, self.config.poll_interval(), startup_delay(order));
        devices.insert(device_id.clone(), ManagedDevice { api, handle });
        drop(devices);

        tracing::info!(device = %device_id, order, "Device added");
        self.event_bus
            .publish(DeviceEvent::device_added(device_id.clone()));

        Ok(AddOutcome::Added(device_id))
    }

    fn update_address(
        &self,
        device_id: &DeviceId,
        device: &ManagedDevice<A>,
        address: &str,
    ) -> Result<AddOutcome> {
        if device.api.address() != address {
            device.api.set_address(address)?;
            tracing::info!(device = %device_id, address, "Device address changed");
            self.event_bus.publish(DeviceEvent::AddressChanged {
                device_id: device_id.clone(),
                address: device.api.address(),
            });
        }
        Ok(AddOutcome::AddressUpdated(device_id.clone()))
    }

    /// Removes a robot, stopping its task and unregistering it from the sink.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the robot is not managed.
    pub async fn remove_device(&self, device_id: &DeviceId) -> Result<()> {
        let device = self
            .devices
            .write()
            .await
            .remove(device_id)
            .ok_or(Error::DeviceNotFound)?;

        device.handle.shutdown().await;

        if let Err(e) = self.sink.unregister_device(device_id).await {
            tracing::warn!(device = %device_id, error = %e, "Sink rejected unregistration");
        }

        tracing::info!(device = %device_id, "Device removed");
        self.event_bus
            .publish(DeviceEvent::device_removed(device_id.clone()));
        Ok(())
    }

    /// Returns a list of all device IDs.
    pub async fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.read().await.keys().cloned().collect()
    }

    /// Returns the number of managed robots.
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Returns true if the robot is managed.
    pub async fn contains(&self, device_id: &DeviceId) -> bool {
        self.devices.read().await.contains_key(device_id)
    }

    /// Returns the current address of a robot.
    pub async fn address(&self, device_id: &DeviceId) -> Option<String> {
        self.devices
            .read()
            .await
            .get(device_id)
            .map(|device| device.api.address())
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Sends a command to a robot and waits for its result.
    ///
    /// The command runs in the robot's task between poll cycles.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the robot is not managed, or the
    /// error the command produced.
    pub async fn send_command(&self, device_id: &DeviceId, command: DeviceCommand) -> Result<()> {
        let commands = self
            .devices
            .read()
            .await
            .get(device_id)
            .map(|device| device.handle.commands())
            .ok_or(Error::DeviceNotFound)?;

        commands.send(command).await
    }

    /// Stops every device task.
    ///
    /// Cycles in progress complete first. Robots stay registered with the sink.
    pub async fn shutdown(&self) {
        let devices = std::mem::take(&mut *self.devices.write().await);
        let count = devices.len();

        for (_, device) in devices {
            device.handle.shutdown().await;
        }

        tracing::info!(devices = count, "Device registry shut down");
    }
}

#[cfg(feature = "http")]
impl<S: AttributeSink> DeviceRegistry<crate::protocol::HttpClient, S> {
    /// Adds a robot by network address using the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or
    /// [`add_device`](Self::add_device) fails.
    pub async fn add_address(&self, address: &str) -> Result<AddOutcome> {
        let client = crate::protocol::HttpClient::new(address)?;
        self.add_device(client).await
    }
}
