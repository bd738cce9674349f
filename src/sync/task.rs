// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device polling task.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{Error, Result};
use crate::event::DeviceId;
use crate::protocol::VacuumApi;
use crate::sink::AttributeSink;

use super::Synchronizer;
use super::command::{CommandRequest, DeviceCommand};

/// Commands queued per device before senders wait.
const COMMAND_QUEUE_CAPACITY: usize = 16;

/// Queues commands to a device task.
#[derive(Debug, Clone)]
pub struct CommandSender {
    device_id: DeviceId,
    tx: mpsc::Sender<CommandRequest>,
}

impl CommandSender {
    /// Queues a command and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShuttingDown` if the task has stopped, or the error
    /// the command itself produced.
    pub async fn send(&self, command: DeviceCommand) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CommandRequest { command, reply })
            .await
            .map_err(|_| Error::ShuttingDown)?;
        rx.await.map_err(|_| Error::ShuttingDown)?
    }

    /// Returns the device this sender targets.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

/// Handle to a running device task.
///
/// Dropping the handle stops the task after its current cycle.
#[derive(Debug)]
pub struct DeviceHandle {
    commands: CommandSender,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl DeviceHandle {
    /// Returns the device ID.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        self.commands.device_id()
    }

    /// Returns a sender for queueing commands.
    #[must_use]
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Queues a command and waits for its result.
    ///
    /// # Errors
    ///
    /// See [`CommandSender::send`].
    pub async fn send(&self, command: DeviceCommand) -> Result<()> {
        self.commands.send(command).await
    }

    /// Returns true if the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signals the task to stop and waits for it.
    ///
    /// A cycle in progress completes first.
    pub async fn shutdown(self) {
        let device_id = self.commands.device_id.clone();
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(device = %device_id, error = %e, "Device task ended abnormally");
        }
    }
}

/// Spawns the polling task of a synchronizer.
///
/// The first cycle runs after `start_delay`, then every `poll_interval`.
/// A cycle that overruns delays the next tick instead of bursting. Commands
/// are handled between cycles.
pub fn spawn_device_task<A, S>(
    mut sync: Synchronizer<A, S>,
    poll_interval: Duration,
    start_delay: Duration,
) -> DeviceHandle
where
    A: VacuumApi,
    S: AttributeSink,
{
    let device_id = sync.id().clone();
    let (tx, mut command_rx) = mpsc::channel::<CommandRequest>(COMMAND_QUEUE_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task_id = device_id.clone();
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + start_delay, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            device = %task_id,
            start_delay_ms = u64::try_from(start_delay.as_millis()).unwrap_or(u64::MAX),
            poll_interval_ms = u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX),
            "Device task started"
        );

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                Some(request) = command_rx.recv() => {
                    let result = sync.handle_command(request.command).await;
                    if let Err(e) = &result {
                        tracing::debug!(device = %task_id, error = %e, "Command failed");
                    }
                    let _ = request.reply.send(result);
                }
                _ = ticker.tick() => {
                    sync.run_cycle().await;
                }
            }
        }

        sync.stop();
        tracing::debug!(device = %task_id, "Device task stopped");
    });

    DeviceHandle {
        commands: CommandSender { device_id, tx },
        shutdown: shutdown_tx,
        join,
    }
}
