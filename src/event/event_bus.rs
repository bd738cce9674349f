// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for device events.

use tokio::sync::broadcast;

use super::DeviceEvent;

/// Events buffered per subscriber before the oldest are dropped.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out of [`DeviceEvent`]s to any number of subscribers.
///
/// The registry and every device task share clones of one bus. Publishing
/// never blocks; a subscriber that falls more than the capacity behind gets
/// `RecvError::Lagged` and resumes with the newest events.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::event::{DeviceEvent, DeviceId, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DeviceEvent::RegionChanged {
///     device_id: DeviceId::new("4f8c2a1e"),
///     region_id: 16,
/// });
///
/// assert!(matches!(
///     rx.try_recv(),
///     Ok(DeviceEvent::RegionChanged { region_id: 16, .. })
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event. Without subscribers the event is dropped.
    pub fn publish(&self, event: DeviceEvent) {
        tracing::trace!(device = %event.device_id(), ?event, "Publishing event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DeviceId;

    #[test]
    fn subscriber_count_follows_receivers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx = bus.subscribe();
        let _rx2 = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::new();
        bus.publish(DeviceEvent::device_removed(DeviceId::new("abc")));

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = DeviceEvent::ConsumableChanged {
            device_id: DeviceId::new("abc"),
            name: "Filter".to_string(),
            life_percent: 8,
            needs_replacement: true,
        };
        bus.publish(event.clone());

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();

        for region_id in 0..4 {
            bus.publish(DeviceEvent::RegionChanged {
                device_id: DeviceId::new("abc"),
                region_id,
            });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert!(matches!(
            rx.recv().await,
            Ok(DeviceEvent::RegionChanged { region_id: 2, .. })
        ));
    }
}
