// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change-gated synchronizer for one robot.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::capabilities::{
    BASIC_CONTROL, Capabilities, FAN_SPEED_CONTROL, MAP_SEGMENTATION, OPERATION_MODE_CONTROL,
    WATER_USAGE_CONTROL,
};
use crate::config::BridgeConfig;
use crate::error::{DeviceError, Error, Result};
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::mapping::{CatalogInput, CleanModeCatalog, ModeSettings, NormalizedState, build_catalog};
use crate::protocol::{FULL_MAP_TIMEOUT, VacuumApi};
use crate::sink::{AttributeSink, AttributeValue, CONSUMABLE_CLUSTER, DeviceRegistration};
use crate::spatial::SpatialIndex;
use crate::state::{DeviceRecord, StateChange};
use crate::telemetry::{RobotIdentity, StateSnapshot};
use crate::types::RunMode;

use super::PUBLISH_PACING;
use super::command::{BasicAction, DeviceCommand, basic_control_payload, segment_cleaning_payload};

/// Preset kinds reported in the state attributes.
const FAN_SPEED_PRESET: &str = "fan_speed";
const WATER_GRADE_PRESET: &str = "water_grade";
const OPERATION_MODE_PRESET: &str = "operation_mode";

/// Lifecycle of a synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Registered, no cycle has completed yet.
    #[default]
    Uninitialized,
    /// The last state fetch succeeded.
    Polling,
    /// The last state fetch failed; the robot is reported unreachable.
    Degraded,
    /// The device task has ended.
    Stopped,
}

/// Polls one robot and publishes normalized changes to the sink.
///
/// A synchronizer is owned by exactly one device task. Every method takes
/// `&mut self`, so cycles and commands never overlap.
pub struct Synchronizer<A: VacuumApi, S: AttributeSink> {
    api: Arc<A>,
    sink: Arc<S>,
    events: EventBus,
    config: Arc<BridgeConfig>,
    record: DeviceRecord,
    state: SyncState,
    pacing: Duration,
}

impl<A: VacuumApi, S: AttributeSink> std::fmt::Debug for Synchronizer<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("device", &self.record.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<A: VacuumApi, S: AttributeSink> Synchronizer<A, S> {
    /// Prepares an identified robot and registers it with the sink.
    ///
    /// Loads capabilities, builds the clean mode catalog from the robot's
    /// presets and, for robots with segment support, the region catalog.
    /// Preset and region loading is best effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability list cannot be fetched or the sink
    /// rejects the registration.
    pub async fn initialize(
        api: Arc<A>,
        sink: Arc<S>,
        events: EventBus,
        config: Arc<BridgeConfig>,
        identity: RobotIdentity,
    ) -> Result<Self> {
        let capabilities = Capabilities::from_names(api.fetch_capabilities().await?);
        let mut record = DeviceRecord::new(identity, capabilities);

        record.clean_modes = load_clean_modes(api.as_ref(), &record.capabilities, &config).await;

        let mut sync = Self {
            api,
            sink,
            events,
            config,
            record,
            state: SyncState::Uninitialized,
            pacing: PUBLISH_PACING,
        };

        if sync.record.capabilities.supports_segments() {
            sync.load_regions().await;
        }

        let registration = DeviceRegistration {
            name: sync.record.name.clone(),
            manufacturer: sync.record.identity.manufacturer.clone(),
            model_name: sync.record.identity.model_name.clone(),
            regions: sync.record.regions.clone(),
            clean_modes: sync.record.clean_modes.clone(),
            run_modes: vec![RunMode::Idle, RunMode::Cleaning],
        };
        sync.sink
            .register_device(&sync.record.id, registration)
            .await?;
        tokio::time::sleep(sync.pacing).await;

        tracing::info!(
            device = %sync.record.id,
            name = %sync.record.name,
            capabilities = sync.record.capabilities.len(),
            clean_modes = sync.record.clean_modes.len(),
            regions = sync.record.regions.len(),
            "Device registered"
        );

        Ok(sync)
    }

    /// Sets the delay after each publication.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Returns the device ID.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.record.id
    }

    /// Returns the device record.
    #[must_use]
    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Marks the synchronizer as stopped.
    pub fn stop(&mut self) {
        self.state = SyncState::Stopped;
    }

    // =========================================================================
    // Poll cycle
    // =========================================================================

    /// Runs one poll cycle.
    ///
    /// Fetches the state attributes once and publishes battery level, charge
    /// state, operational state, run mode and clean mode, each only if it
    /// changed. Region tracking and consumable checks follow; their failures
    /// are logged and never mark the robot offline.
    pub async fn run_cycle(&mut self) {
        let attributes = match self.api.fetch_state_attributes().await {
            Ok(attributes) => attributes,
            Err(e) => {
                self.mark_offline(&e).await;
                return;
            }
        };
        self.mark_online().await;

        let snapshot = StateSnapshot::from_attributes(&attributes);
        let normalized = NormalizedState::from_snapshot(&snapshot);

        for change in StateChange::from_normalized(&normalized) {
            self.publish_change(change).await;
        }

        if let Some(entry) = self.record.clean_modes.resolve(&current_presets(&snapshot)) {
            let change = StateChange::CleanMode(entry.code);
            self.publish_change(change).await;
        }

        if self.record.capabilities.supports_segments()
            && let Err(e) = self.sync_region().await
        {
            tracing::debug!(device = %self.record.id, error = %e, "Region tracking failed");
        }

        if self.config.consumables.enabled
            && self.record.capabilities.supports_consumables()
            && self.record.consumables.is_due(Instant::now())
            && let Err(e) = self.check_consumables().await
        {
            tracing::debug!(device = %self.record.id, error = %e, "Consumable check failed");
        }

        self.record.pending_initial_state = false;
    }

    async fn mark_offline(&mut self, error: &Error) {
        if self.state != SyncState::Degraded {
            tracing::warn!(device = %self.record.id, error = %error, "Device offline");
            self.events
                .publish(DeviceEvent::offline(self.record.id.clone(), error.to_string()));
            if let Err(e) = self.sink.set_reachable(&self.record.id, false).await {
                tracing::debug!(device = %self.record.id, error = %e, "Sink rejected reachability");
            }
            tokio::time::sleep(self.pacing).await;
        } else {
            tracing::debug!(device = %self.record.id, error = %error, "Device still offline");
        }
        self.state = SyncState::Degraded;
    }

    async fn mark_online(&mut self) {
        match self.state {
            SyncState::Degraded => {
                tracing::info!(device = %self.record.id, "Device online again");
                self.events.publish(DeviceEvent::online(self.record.id.clone()));
                if let Err(e) = self.sink.set_reachable(&self.record.id, true).await {
                    tracing::debug!(device = %self.record.id, error = %e, "Sink rejected reachability");
                }
                tokio::time::sleep(self.pacing).await;
            }
            SyncState::Uninitialized => {
                tracing::info!(device = %self.record.id, "Polling started");
            }
            SyncState::Polling | SyncState::Stopped => {}
        }
        self.state = SyncState::Polling;
    }

    /// Publishes a change if it differs from the last published value.
    ///
    /// Returns true if the sink accepted a write.
    async fn publish_change(&mut self, change: StateChange) -> bool {
        if !self.record.pending_initial_state && !self.record.published.is_changed_by(&change) {
            return false;
        }

        let path = change.attribute();
        let value = change.value();
        let accepted = match self
            .sink
            .publish_attribute(&self.record.id, path.cluster, path.attribute, value)
            .await
        {
            Ok(()) => {
                tracing::debug!(device = %self.record.id, attribute = %path, value = %value, "Published attribute");
                self.record.published.apply(&change);
                true
            }
            Err(e) => {
                tracing::warn!(device = %self.record.id, attribute = %path, error = %e, "Sink rejected attribute");
                false
            }
        };

        tokio::time::sleep(self.pacing).await;
        accepted
    }

    // =========================================================================
    // Region tracking
    // =========================================================================

    async fn rebuild_index(&mut self) -> Result<()> {
        let map = self.api.fetch_full_map(FULL_MAP_TIMEOUT).await?;
        let index = SpatialIndex::from_map(&map, Instant::now(), self.config.map_refresh_interval());

        let regions = index.regions();
        if !regions.is_empty() && regions != self.record.regions {
            tracing::debug!(device = %self.record.id, regions = regions.len(), "Region catalog changed");
            self.record.regions = regions;
        }

        tracing::debug!(
            device = %self.record.id,
            version = index.version(),
            layers = index.layers().len(),
            "Spatial index rebuilt"
        );
        self.record.spatial = Some(index);
        Ok(())
    }

    async fn sync_region(&mut self) -> Result<()> {
        let position = self.api.fetch_position().await?;
        let valid = self
            .record
            .spatial
            .as_ref()
            .is_some_and(|index| index.is_valid_for(position.meta_data.version, Instant::now()));
        if !valid {
            self.rebuild_index().await?;
        }

        let Some((x, y)) = position.robot_position() else {
            return Ok(());
        };
        let Some(index) = self.record.spatial.as_ref() else {
            return Ok(());
        };
        let (x, y) = index.to_index_units(x, y);
        let Some(region_id) = index.locate(x, y) else {
            return Ok(());
        };

        if self.publish_change(StateChange::CurrentArea(region_id)).await {
            self.events.publish(DeviceEvent::RegionChanged {
                device_id: self.record.id.clone(),
                region_id,
            });
        }
        Ok(())
    }

    async fn load_regions(&mut self) {
        match self.rebuild_index().await {
            Ok(()) if !self.record.regions.is_empty() => return,
            Ok(()) => {}
            Err(e) => {
                tracing::debug!(device = %self.record.id, error = %e, "Map unavailable, using segment list");
            }
        }

        match self.api.fetch_segments().await {
            Ok(segments) => {
                for segment in segments {
                    let Some(id) = segment.id.as_u32() else {
                        continue;
                    };
                    let name = segment.name.unwrap_or_else(|| id.to_string());
                    self.record.regions.entry(name).or_insert(id);
                }
            }
            Err(e) => {
                tracing::debug!(device = %self.record.id, error = %e, "Segment list unavailable");
            }
        }
    }

    // =========================================================================
    // Consumables
    // =========================================================================

    async fn check_consumables(&mut self) -> Result<()> {
        let now = Instant::now();
        self.record.consumables.mark_checked(now);

        let consumables = self.api.fetch_consumables().await?;
        let alerts = self
            .record
            .consumables
            .evaluate(&consumables, &self.config.consumables, now);

        for alert in alerts {
            if alert.needs_replacement {
                tracing::warn!(
                    device = %self.record.id,
                    consumable = %alert.name,
                    life_percent = alert.life_percent,
                    "Consumable needs replacement"
                );
            } else {
                tracing::info!(device = %self.record.id, consumable = %alert.name, "Consumable replaced");
            }

            if let Err(e) = self
                .sink
                .publish_attribute(
                    &self.record.id,
                    CONSUMABLE_CLUSTER,
                    &alert.name,
                    AttributeValue::Bool(alert.needs_replacement),
                )
                .await
            {
                tracing::debug!(device = %self.record.id, consumable = %alert.name, error = %e, "Sink rejected consumable");
            }
            tokio::time::sleep(self.pacing).await;

            self.events.publish(DeviceEvent::ConsumableChanged {
                device_id: self.record.id.clone(),
                name: alert.name,
                life_percent: alert.life_percent,
                needs_replacement: alert.needs_replacement,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Executes a control command.
    ///
    /// # Errors
    ///
    /// Returns an error if the robot lacks the needed capability, the command
    /// references an unknown mode or region, or the robot rejects it.
    pub async fn handle_command(&mut self, command: DeviceCommand) -> Result<()> {
        tracing::debug!(device = %self.record.id, command = command.name(), "Handling command");

        match command {
            DeviceCommand::SelectAreas(ids) => self.select_areas(ids),
            DeviceCommand::ChangeRunMode(code) => self.change_run_mode(code).await,
            DeviceCommand::ChangeCleanMode(code) => self.change_clean_mode(code).await,
            DeviceCommand::Pause => self.basic_control(BasicAction::Pause).await,
            DeviceCommand::Resume => self.basic_control(BasicAction::Start).await,
            DeviceCommand::GoHome => self.basic_control(BasicAction::Home).await,
        }
    }

    fn require(&self, capability: &str) -> Result<()> {
        if self.record.capabilities.has(capability) {
            Ok(())
        } else {
            Err(Error::CapabilityNotSupported(capability.to_string()))
        }
    }

    fn select_areas(&mut self, ids: Vec<u32>) -> Result<()> {
        if ids.is_empty() {
            self.record.selected_regions.clear();
            return Ok(());
        }
        self.require(MAP_SEGMENTATION)?;

        if let Some(unknown) = ids.iter().find(|id| !self.record.has_region(**id)) {
            return Err(DeviceError::UnknownRegion(*unknown).into());
        }
        self.record.selected_regions = ids.into_iter().collect();
        Ok(())
    }

    async fn basic_control(&self, action: BasicAction) -> Result<()> {
        self.require(BASIC_CONTROL)?;
        self.api
            .send_control_command(BASIC_CONTROL, basic_control_payload(action))
            .await
    }

    async fn change_run_mode(&self, code: u8) -> Result<()> {
        match RunMode::from_code(code) {
            Some(RunMode::Idle) => self.basic_control(BasicAction::Home).await,
            Some(RunMode::Cleaning) if self.record.selected_regions.is_empty() => {
                self.basic_control(BasicAction::Start).await
            }
            Some(RunMode::Cleaning) => {
                self.require(MAP_SEGMENTATION)?;
                self.api
                    .send_control_command(
                        MAP_SEGMENTATION,
                        segment_cleaning_payload(&self.record.selected_regions),
                    )
                    .await
            }
            Some(RunMode::Mapping) | None => Err(DeviceError::UnsupportedRunMode(code).into()),
        }
    }

    async fn change_clean_mode(&self, code: u8) -> Result<()> {
        let entry = self
            .record
            .clean_modes
            .get(code)
            .ok_or(DeviceError::UnknownCleanMode(code))?;
        let settings = entry.settings.clone();

        let steps = [
            (OPERATION_MODE_CONTROL, settings.operation_mode),
            (FAN_SPEED_CONTROL, settings.fan_speed),
            (WATER_USAGE_CONTROL, settings.water_usage),
        ];
        for (capability, preset) in steps {
            let Some(preset) = preset else { continue };
            self.require(capability)?;
            self.api.apply_preset(capability, &preset).await?;
        }
        Ok(())
    }
}

fn current_presets(snapshot: &StateSnapshot) -> ModeSettings {
    ModeSettings {
        operation_mode: snapshot.preset(OPERATION_MODE_PRESET).map(str::to_string),
        fan_speed: snapshot.preset(FAN_SPEED_PRESET).map(str::to_string),
        water_usage: snapshot.preset(WATER_GRADE_PRESET).map(str::to_string),
    }
}

async fn load_clean_modes<A: VacuumApi>(
    api: &A,
    capabilities: &Capabilities,
    config: &BridgeConfig,
) -> CleanModeCatalog {
    let fan_presets = load_presets(api, capabilities, FAN_SPEED_CONTROL).await;
    let water_presets = load_presets(api, capabilities, WATER_USAGE_CONTROL).await;
    let operation_modes = if capabilities.supports_operation_modes() {
        Some(load_presets(api, capabilities, OPERATION_MODE_CONTROL).await)
    } else {
        None
    };

    build_catalog(
        &CatalogInput {
            operation_modes: operation_modes.as_deref(),
            fan_presets: &fan_presets,
            water_presets: &water_presets,
        },
        config,
    )
}

async fn load_presets<A: VacuumApi>(
    api: &A,
    capabilities: &Capabilities,
    capability: &str,
) -> Vec<String> {
    if !capabilities.has(capability) {
        return Vec::new();
    }
    match api.fetch_presets(capability).await {
        Ok(presets) => presets,
        Err(e) => {
            tracing::debug!(capability, error = %e, "Presets unavailable");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;
    use serde_json::Value;

    use super::*;
    use crate::capabilities::CONSUMABLE_MONITORING;
    use crate::error::{ProtocolError, SinkError};
    use crate::sink::{
        BATTERY_CHARGE_STATE, BATTERY_PERCENT, CLEAN_MODE, CURRENT_AREA, OPERATIONAL_STATE,
        RUN_MODE,
    };
    use crate::telemetry::{
        Consumable, MapPayload, PositionPayload, Segment, StateAttribute, parse_map,
        parse_position, parse_state_attributes,
    };

    #[derive(Default)]
    struct FakeApi {
        capabilities: Vec<String>,
        presets: HashMap<String, Vec<String>>,
        attributes: Mutex<Option<Vec<StateAttribute>>>,
        map: Mutex<Option<MapPayload>>,
        position: Mutex<Option<PositionPayload>>,
        consumables: Mutex<Option<Vec<Consumable>>>,
        map_fetches: Mutex<usize>,
        consumable_fetches: Mutex<usize>,
        sent: Mutex<Vec<(String, Value)>>,
    }

    fn offline() -> Error {
        ProtocolError::ConnectionFailed("unreachable".to_string()).into()
    }

    impl FakeApi {
        fn with_capabilities(names: &[&str]) -> Self {
            Self {
                capabilities: names.iter().map(|s| (*s).to_string()).collect(),
                ..Self::default()
            }
        }

        fn set_state(&self, body: &str) {
            *self.attributes.lock() = Some(parse_state_attributes(body).unwrap());
        }

        fn set_offline(&self) {
            *self.attributes.lock() = None;
        }
    }

    impl VacuumApi for FakeApi {
        fn address(&self) -> String {
            "http://fake".to_string()
        }

        fn set_address(&self, _address: &str) -> std::result::Result<(), ProtocolError> {
            Ok(())
        }

        async fn fetch_identity(&self) -> Result<RobotIdentity> {
            Ok(identity())
        }

        async fn fetch_capabilities(&self) -> Result<Vec<String>> {
            Ok(self.capabilities.clone())
        }

        async fn fetch_state_attributes(&self) -> Result<Vec<StateAttribute>> {
            self.attributes.lock().clone().ok_or_else(offline)
        }

        async fn fetch_full_map(&self, _timeout: Duration) -> Result<MapPayload> {
            *self.map_fetches.lock() += 1;
            self.map.lock().clone().ok_or_else(offline)
        }

        async fn fetch_position(&self) -> Result<PositionPayload> {
            self.position.lock().clone().ok_or_else(offline)
        }

        async fn fetch_consumables(&self) -> Result<Vec<Consumable>> {
            *self.consumable_fetches.lock() += 1;
            self.consumables.lock().clone().ok_or_else(offline)
        }

        async fn fetch_presets(&self, capability: &str) -> Result<Vec<String>> {
            Ok(self.presets.get(capability).cloned().unwrap_or_default())
        }

        async fn fetch_segments(&self) -> Result<Vec<Segment>> {
            Ok(serde_json::from_str(r#"[{"id":"5","name":"Office"}]"#).unwrap())
        }

        async fn send_control_command(&self, capability: &str, payload: Value) -> Result<()> {
            self.sent.lock().push((capability.to_string(), payload));
            Ok(())
        }

        async fn apply_preset(&self, capability: &str, name: &str) -> Result<()> {
            self.sent
                .lock()
                .push((format!("{capability}/preset"), Value::String(name.to_string())));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, String, AttributeValue)>>,
        reachable: Mutex<Vec<bool>>,
        registrations: Mutex<Vec<DeviceRegistration>>,
        timeline: Mutex<Vec<(String, Instant)>>,
    }

    impl RecordingSink {
        fn take(&self) -> Vec<(String, String, AttributeValue)> {
            std::mem::take(&mut *self.writes.lock())
        }

        fn stamp(&self, what: String) {
            self.timeline.lock().push((what, Instant::now()));
        }

        fn timeline(&self) -> Vec<String> {
            self.timeline.lock().iter().map(|(what, _)| what.clone()).collect()
        }

        fn assert_paced(&self) {
            let timeline = self.timeline.lock();
            for pair in timeline.windows(2) {
                let gap = pair[1].1.duration_since(pair[0].1);
                assert!(
                    gap >= PUBLISH_PACING,
                    "{} -> {} only {gap:?} apart",
                    pair[0].0,
                    pair[1].0
                );
            }
        }
    }

    impl AttributeSink for RecordingSink {
        async fn register_device(
            &self,
            _device_id: &DeviceId,
            registration: DeviceRegistration,
        ) -> std::result::Result<(), SinkError> {
            self.stamp("register".to_string());
            self.registrations.lock().push(registration);
            Ok(())
        }

        async fn publish_attribute(
            &self,
            _device_id: &DeviceId,
            cluster: &str,
            attribute: &str,
            value: AttributeValue,
        ) -> std::result::Result<(), SinkError> {
            self.stamp(format!("{cluster}.{attribute}"));
            self.writes
                .lock()
                .push((cluster.to_string(), attribute.to_string(), value));
            Ok(())
        }

        async fn set_reachable(
            &self,
            _device_id: &DeviceId,
            reachable: bool,
        ) -> std::result::Result<(), SinkError> {
            self.stamp(format!("reachable={reachable}"));
            self.reachable.lock().push(reachable);
            Ok(())
        }

        async fn unregister_device(&self, _device_id: &DeviceId) -> std::result::Result<(), SinkError> {
            Ok(())
        }
    }

    fn identity() -> RobotIdentity {
        RobotIdentity {
            system_id: "robot-1".to_string(),
            manufacturer: "Dreame".to_string(),
            model_name: "L10S".to_string(),
        }
    }

    fn state_body(level: u32, status: &str) -> String {
        format!(
            r#"[{{"__class":"BatteryStateAttribute","level":{level},"flag":"discharging"}},
                {{"__class":"StatusStateAttribute","value":"{status}","flag":"none"}}]"#
        )
    }

    const MAP: &str = r#"{
        "pixelSize": 5,
        "metaData": {"version": 1},
        "layers": [
            {"type": "segment", "metaData": {"segmentId": "16", "name": "Kitchen"},
             "dimensions": {"x": {"min": 0, "max": 100, "mid": 50},
                            "y": {"min": 0, "max": 100, "mid": 50}}},
            {"type": "segment", "metaData": {"segmentId": "17", "name": "Hall"},
             "dimensions": {"x": {"min": 101, "max": 200, "mid": 150},
                            "y": {"min": 0, "max": 100, "mid": 50}}}
        ],
        "entities": []
    }"#;

    fn position_body(version: u32, x: f64, y: f64) -> String {
        format!(
            r#"{{"metaData":{{"version":{version}}},
                "entities":[{{"type":"robot_position","points":[{x},{y}]}}]}}"#
        )
    }

    async fn synchronizer(
        api: FakeApi,
        config: BridgeConfig,
    ) -> (
        Synchronizer<FakeApi, RecordingSink>,
        Arc<FakeApi>,
        Arc<RecordingSink>,
    ) {
        let api = Arc::new(api);
        let sink = Arc::new(RecordingSink::default());
        let sync = Synchronizer::initialize(
            Arc::clone(&api),
            Arc::clone(&sink),
            EventBus::new(),
            Arc::new(config),
            identity(),
        )
        .await
        .unwrap();
        (sync, api, sink)
    }

    fn paths(writes: &[(String, String, AttributeValue)]) -> Vec<String> {
        writes.iter().map(|(c, a, _)| format!("{c}.{a}")).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_publishes_every_attribute_once() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        api.set_state(&state_body(80, "docked"));
        let (mut sync, _api, sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.run_cycle().await;

        let writes = sink.take();
        assert_eq!(
            paths(&writes),
            vec![
                BATTERY_PERCENT.to_string(),
                BATTERY_CHARGE_STATE.to_string(),
                OPERATIONAL_STATE.to_string(),
                RUN_MODE.to_string(),
                CLEAN_MODE.to_string(),
            ]
        );
        assert_eq!(writes[0].2, AttributeValue::U8(160));
        assert_eq!(writes[2].2, AttributeValue::U8(66));
        assert!(!sync.record().pending_initial_state);
        assert_eq!(sync.state(), SyncState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn identical_cycles_publish_nothing() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        api.set_state(&state_body(80, "docked"));
        let (mut sync, _api, sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.run_cycle().await;
        sink.take();
        sync.run_cycle().await;

        assert!(sink.take().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn battery_only_change_publishes_once() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        api.set_state(&state_body(80, "cleaning"));
        let (mut sync, api, sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.run_cycle().await;
        sink.take();
        api.set_state(&state_body(79, "cleaning"));
        sync.run_cycle().await;

        let writes = sink.take();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, BATTERY_PERCENT.attribute);
        assert_eq!(writes[0].2, AttributeValue::U8(158));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_degrades_and_recovers() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        api.set_state(&state_body(80, "docked"));
        let (mut sync, api, sink) = synchronizer(api, BridgeConfig::default()).await;
        let mut events = sync.events.subscribe();

        sync.run_cycle().await;
        sink.take();

        api.set_offline();
        sync.run_cycle().await;
        sync.run_cycle().await;
        assert_eq!(sync.state(), SyncState::Degraded);
        assert!(sink.take().is_empty());

        api.set_state(&state_body(80, "docked"));
        sync.run_cycle().await;
        assert_eq!(sync.state(), SyncState::Polling);

        // Offline and online are each reported once
        assert_eq!(*sink.reachable.lock(), vec![false, true]);
        assert!(matches!(
            events.recv().await.unwrap(),
            DeviceEvent::ConnectionChanged { online: false, .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            DeviceEvent::ConnectionChanged { online: true, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_writes_are_spaced() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        api.set_state(&state_body(80, "docked"));
        let (mut sync, _api, sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.run_cycle().await;

        assert_eq!(
            sink.timeline(),
            vec![
                "register".to_string(),
                BATTERY_PERCENT.to_string(),
                BATTERY_CHARGE_STATE.to_string(),
                OPERATIONAL_STATE.to_string(),
                RUN_MODE.to_string(),
                CLEAN_MODE.to_string(),
            ]
        );
        sink.assert_paced();
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_writes_are_spaced() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        api.set_state(&state_body(80, "docked"));
        let (mut sync, api, sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.run_cycle().await;
        api.set_offline();
        sync.run_cycle().await;
        api.set_state(&state_body(60, "docked"));
        sync.run_cycle().await;

        let timeline = sink.timeline();
        assert_eq!(
            &timeline[6..],
            &[
                "reachable=false".to_string(),
                "reachable=true".to_string(),
                BATTERY_PERCENT.to_string(),
            ]
        );
        sink.assert_paced();
    }

    #[tokio::test(start_paused = true)]
    async fn region_is_published_on_change() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL, MAP_SEGMENTATION]);
        api.set_state(&state_body(80, "cleaning"));
        *api.map.lock() = Some(parse_map(MAP).unwrap());
        *api.position.lock() = Some(parse_position(&position_body(1, 250.0, 250.0)).unwrap());
        let (mut sync, api, sink) = synchronizer(api, BridgeConfig::default()).await;

        assert_eq!(sync.record().regions.get("Kitchen"), Some(&16));
        assert_eq!(sink.registrations.lock()[0].regions.len(), 2);

        sync.run_cycle().await;
        let writes = sink.take();
        assert_eq!(writes.last().unwrap().1, CURRENT_AREA.attribute);
        assert_eq!(writes.last().unwrap().2, AttributeValue::U32(16));

        // Same region again: nothing new
        sync.run_cycle().await;
        assert!(sink.take().is_empty());

        // (750, 250) / 5 = (150, 50) is in the hall
        *api.position.lock() = Some(parse_position(&position_body(1, 750.0, 250.0)).unwrap());
        sync.run_cycle().await;
        assert_eq!(sink.take(), vec![(
            "ServiceArea".to_string(),
            "currentArea".to_string(),
            AttributeValue::U32(17)
        )]);

        // Map built once at setup, reused while valid
        assert_eq!(*api.map_fetches.lock(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn map_version_change_rebuilds_index() {
        let api = FakeApi::with_capabilities(&[MAP_SEGMENTATION]);
        api.set_state(&state_body(80, "cleaning"));
        *api.map.lock() = Some(parse_map(MAP).unwrap());
        *api.position.lock() = Some(parse_position(&position_body(2, 250.0, 250.0)).unwrap());
        let (mut sync, api, _sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.run_cycle().await;
        assert_eq!(*api.map_fetches.lock(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_index_is_rebuilt() {
        let api = FakeApi::with_capabilities(&[MAP_SEGMENTATION]);
        api.set_state(&state_body(80, "cleaning"));
        *api.map.lock() = Some(parse_map(MAP).unwrap());
        *api.position.lock() = Some(parse_position(&position_body(1, 250.0, 250.0)).unwrap());
        let config = BridgeConfig::default().with_map_refresh_hours(0.1);
        let (mut sync, api, _sink) = synchronizer(api, config).await;

        sync.run_cycle().await;
        assert_eq!(*api.map_fetches.lock(), 1);

        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        sync.run_cycle().await;
        assert_eq!(*api.map_fetches.lock(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn region_failure_does_not_degrade() {
        let api = FakeApi::with_capabilities(&[MAP_SEGMENTATION]);
        api.set_state(&state_body(80, "cleaning"));
        let (mut sync, _api, sink) = synchronizer(api, BridgeConfig::default()).await;

        // Map unavailable at setup: regions come from the segment list
        assert_eq!(sync.record().regions.get("Office"), Some(&5));

        sync.run_cycle().await;
        assert_eq!(sync.state(), SyncState::Polling);
        assert!(sink.reachable.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn consumables_checked_hourly_and_alert_once() {
        let api = FakeApi::with_capabilities(&[CONSUMABLE_MONITORING]);
        api.set_state(&state_body(80, "docked"));
        *api.consumables.lock() = Some(
            serde_json::from_str(
                r#"[{"type":"brush","subType":"main","remaining":{"value":200,"unit":"minutes"}}]"#,
            )
            .unwrap(),
        );
        let (mut sync, api, sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.run_cycle().await;
        let writes = sink.take();
        assert_eq!(
            writes.last().unwrap(),
            &(
                CONSUMABLE_CLUSTER.to_string(),
                "Main Brush".to_string(),
                AttributeValue::Bool(true)
            )
        );

        // Within the hour: not fetched again
        sync.run_cycle().await;
        assert_eq!(*api.consumable_fetches.lock(), 1);

        // Two more hourly checks, no new alert
        for _ in 0..2 {
            tokio::time::advance(Duration::from_secs(3600)).await;
            sync.run_cycle().await;
        }
        assert_eq!(*api.consumable_fetches.lock(), 3);
        assert!(sink.take().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn consumables_disabled_by_config() {
        let api = FakeApi::with_capabilities(&[CONSUMABLE_MONITORING]);
        api.set_state(&state_body(80, "docked"));
        let config = BridgeConfig::default()
            .with_consumables(crate::config::ConsumableConfig::default().disabled());
        let (mut sync, api, _sink) = synchronizer(api, config).await;

        sync.run_cycle().await;
        assert_eq!(*api.consumable_fetches.lock(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_mode_catalog_from_presets() {
        let mut api = FakeApi::with_capabilities(&[FAN_SPEED_CONTROL, BASIC_CONTROL]);
        api.presets.insert(
            FAN_SPEED_CONTROL.to_string(),
            vec!["low".to_string(), "max".to_string()],
        );
        api.set_state(
            r#"[{"__class":"PresetSelectionStateAttribute","type":"fan_speed","value":"max"}]"#,
        );
        let (mut sync, api, sink) = synchronizer(api, BridgeConfig::default()).await;

        let labels: Vec<String> = sink.registrations.lock()[0]
            .clean_modes
            .iter()
            .map(|e| e.label.clone())
            .collect();
        assert_eq!(labels, vec!["Vacuum Low", "Vacuum Max"]);

        sync.run_cycle().await;
        assert_eq!(
            sink.take(),
            vec![(
                "RvcCleanMode".to_string(),
                "currentMode".to_string(),
                AttributeValue::U8(4)
            )]
        );

        sync.handle_command(DeviceCommand::ChangeCleanMode(2))
            .await
            .unwrap();
        assert_eq!(
            api.sent.lock().as_slice(),
            &[(
                format!("{FAN_SPEED_CONTROL}/preset"),
                Value::String("low".to_string())
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_clean_mode_is_rejected() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        let (mut sync, _api, _sink) = synchronizer(api, BridgeConfig::default()).await;

        let err = sync
            .handle_command(DeviceCommand::ChangeCleanMode(99))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Device(DeviceError::UnknownCleanMode(99))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn selected_areas_start_segment_clean() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL, MAP_SEGMENTATION]);
        *api.map.lock() = Some(parse_map(MAP).unwrap());
        let (mut sync, api, _sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.handle_command(DeviceCommand::SelectAreas(vec![17, 16]))
            .await
            .unwrap();
        sync.handle_command(DeviceCommand::ChangeRunMode(RunMode::Cleaning.code()))
            .await
            .unwrap();

        let sent = api.sent.lock();
        assert_eq!(sent[0].0, MAP_SEGMENTATION);
        assert_eq!(sent[0].1["segment_ids"], serde_json::json!(["16", "17"]));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_area_is_rejected() {
        let api = FakeApi::with_capabilities(&[MAP_SEGMENTATION]);
        *api.map.lock() = Some(parse_map(MAP).unwrap());
        let (mut sync, _api, _sink) = synchronizer(api, BridgeConfig::default()).await;

        let err = sync
            .handle_command(DeviceCommand::SelectAreas(vec![16, 99]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::UnknownRegion(99))));
        assert!(sync.record().selected_regions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_mode_commands() {
        let api = FakeApi::with_capabilities(&[BASIC_CONTROL]);
        let (mut sync, api, _sink) = synchronizer(api, BridgeConfig::default()).await;

        sync.handle_command(DeviceCommand::ChangeRunMode(2))
            .await
            .unwrap();
        sync.handle_command(DeviceCommand::ChangeRunMode(1))
            .await
            .unwrap();
        assert!(matches!(
            sync.handle_command(DeviceCommand::ChangeRunMode(3)).await,
            Err(Error::Device(DeviceError::UnsupportedRunMode(3)))
        ));

        let actions: Vec<Value> = api.sent.lock().iter().map(|(_, p)| p["action"].clone()).collect();
        assert_eq!(actions, vec!["start", "home"]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_capability_is_reported() {
        let api = FakeApi::with_capabilities(&[]);
        let (mut sync, _api, _sink) = synchronizer(api, BridgeConfig::default()).await;

        let err = sync.handle_command(DeviceCommand::Pause).await.unwrap_err();
        assert!(matches!(err, Error::CapabilityNotSupported(ref c) if c == BASIC_CONTROL));
    }
}
