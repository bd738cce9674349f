// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control commands routed to a device task.

use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::error::Result;

/// A control request from the bridge side.
///
/// Commands are queued to the owning device task and executed between
/// poll cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Replaces the set of regions targeted by the next clean.
    ///
    /// An empty list clears the selection, so the next clean covers the
    /// whole home.
    SelectAreas(Vec<u32>),
    /// Switches run mode by mode number.
    ///
    /// Switching to cleaning starts a targeted clean if regions are selected
    /// and a whole-home clean otherwise. Switching to idle sends the robot
    /// back to its dock.
    ChangeRunMode(u8),
    /// Applies the presets of a clean mode by mode code.
    ChangeCleanMode(u8),
    /// Pauses the current task.
    Pause,
    /// Resumes a paused task.
    Resume,
    /// Returns to the dock.
    GoHome,
}

impl DeviceCommand {
    /// Returns a short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectAreas(_) => "select_areas",
            Self::ChangeRunMode(_) => "change_run_mode",
            Self::ChangeCleanMode(_) => "change_clean_mode",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::GoHome => "go_home",
        }
    }
}

/// A queued command with its reply channel.
#[derive(Debug)]
pub(crate) struct CommandRequest {
    pub command: DeviceCommand,
    pub reply: oneshot::Sender<Result<()>>,
}

/// Actions of the basic control capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BasicAction {
    Start,
    Pause,
    Home,
}

impl BasicAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Home => "home",
        }
    }
}

/// Body of a basic control request.
pub(crate) fn basic_control_payload(action: BasicAction) -> Value {
    json!({ "action": action.as_str() })
}

/// Body of a segment cleaning request.
///
/// Segment ids are sent as strings in ascending order.
pub(crate) fn segment_cleaning_payload<'a>(segment_ids: impl IntoIterator<Item = &'a u32>) -> Value {
    let ids: Vec<String> = segment_ids.into_iter().map(u32::to_string).collect();
    json!({
        "action": "start_segment_action",
        "segment_ids": ids,
        "iterations": 1,
        "customOrder": true,
    })
}
