//! Presets, replicated preset state and the material consumer

use crate::constants::{preset as limits, safe_mode};
use crate::error::PipelineError;
use crate::modulator::clamp_setting;
use crate::throttle::RateLimiter;
use std::time::Duration;
use tracing::{debug, info};

/// A named bundle of material settings
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub master_gain: f32,
    pub signal_gain: f32,
    pub smoothing: f32,
    pub emission_gain: f32,
    pub safe_mode: bool,
    pub beat_pulse: bool,
}

impl Preset {
    pub fn calm() -> Self {
        Self {
            name: "Calm".to_string(),
            master_gain: 0.7,
            signal_gain: 1.0,
            smoothing: 0.25,
            emission_gain: 0.8,
            safe_mode: true,
            beat_pulse: false,
        }
    }

    pub fn default_preset() -> Self {
        Self {
            name: "Default".to_string(),
            master_gain: 1.0,
            signal_gain: 1.5,
            smoothing: 0.15,
            emission_gain: 1.0,
            safe_mode: false,
            beat_pulse: true,
        }
    }

    pub fn hype() -> Self {
        Self {
            name: "Hype".to_string(),
            master_gain: 1.3,
            signal_gain: 2.0,
            smoothing: 0.08,
            emission_gain: 1.5,
            safe_mode: false,
            beat_pulse: true,
        }
    }
}

/// Fixed, non-empty, ordered set of presets
#[derive(Debug, Clone, PartialEq)]
pub struct PresetTable {
    presets: Vec<Preset>,
}

impl PresetTable {
    pub fn new(presets: Vec<Preset>) -> Result<Self, PipelineError> {
        if presets.is_empty() {
            return Err(PipelineError::EmptyPresetTable);
        }
        Ok(Self { presets })
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Nearest valid index to `index`
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.presets.len() - 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self {
            presets: vec![Preset::calm(), Preset::default_preset(), Preset::hype()],
        }
    }
}

/// Look up a preset, clamping `index` into the table
pub fn select_preset(table: &PresetTable, index: usize) -> &Preset {
    &table.presets[table.clamp_index(index)]
}

/// The live, replicated configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PresetState {
    pub current_index: usize,
    pub master_gain: f32,
    pub emission_gain: f32,
    pub smoothing: f32,
    pub safe_mode: bool,
    pub beat_pulse: bool,
}

impl PresetState {
    pub fn from_preset(index: usize, preset: &Preset) -> Self {
        Self {
            current_index: index,
            master_gain: preset.master_gain,
            emission_gain: preset.emission_gain,
            smoothing: preset.smoothing,
            safe_mode: preset.safe_mode,
            beat_pulse: preset.beat_pulse,
        }
    }

    /// Output values for the renderer, with the safe-mode transform applied.
    ///
    /// Always derived from the live fields; nothing is written back.
    pub fn material_params(&self) -> MaterialParams {
        let (al_gain, emission_gain, al_smoothing) = if self.safe_mode {
            (
                (self.master_gain * safe_mode::GAIN_SCALE)
                    .clamp(safe_mode::GAIN_MIN, safe_mode::GAIN_MAX),
                (self.emission_gain * safe_mode::EMISSION_SCALE)
                    .clamp(safe_mode::EMISSION_MIN, safe_mode::EMISSION_MAX),
                (self.smoothing + safe_mode::SMOOTHING_OFFSET)
                    .clamp(safe_mode::SMOOTHING_MIN, safe_mode::SMOOTHING_MAX),
            )
        } else {
            (
                self.master_gain * safe_mode::UNSAFE_GAIN_SCALE,
                self.emission_gain,
                self.smoothing,
            )
        };

        MaterialParams {
            al_gain,
            al_smoothing,
            emission_gain,
            al_enable: 1.0,
            safe_mode: self.safe_mode,
            beat_pulse: self.beat_pulse,
        }
    }

    /// Bring an externally supplied snapshot inside the declared ranges
    fn sanitized(mut self, table: &PresetTable) -> Self {
        self.current_index = table.clamp_index(self.current_index);
        self.master_gain = clamp_setting(
            "master_gain",
            self.master_gain,
            limits::MASTER_GAIN_MIN,
            limits::MASTER_GAIN_MAX,
        )
        .unwrap_or(limits::MASTER_GAIN_MIN);
        self.emission_gain = clamp_setting(
            "emission_gain",
            self.emission_gain,
            limits::EMISSION_GAIN_MIN,
            limits::EMISSION_GAIN_MAX,
        )
        .unwrap_or(limits::EMISSION_GAIN_MIN);
        self.smoothing = clamp_setting(
            "smoothing",
            self.smoothing,
            limits::SMOOTHING_MIN,
            limits::SMOOTHING_MAX,
        )
        .unwrap_or(limits::SMOOTHING_MIN);
        self
    }
}

/// Shader-facing parameters materialized from a [`PresetState`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub al_gain: f32,
    pub al_smoothing: f32,
    pub emission_gain: f32,
    pub al_enable: f32,
    pub safe_mode: bool,
    pub beat_pulse: bool,
}

/// Pushes owner-side state changes to the other participants
pub trait Replicator {
    fn replicate(&mut self, state: &PresetState);
}

/// Replicator for instances that never share their state
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReplication;

impl Replicator for NoReplication {
    fn replicate(&mut self, _state: &PresetState) {}
}

impl<F: FnMut(&PresetState)> Replicator for F {
    fn replicate(&mut self, state: &PresetState) {
        self(state)
    }
}

/// Owns the preset table and live state of one material consumer
pub struct PresetController<R: Replicator = NoReplication> {
    table: PresetTable,
    state: PresetState,
    replicator: R,
    is_owner: bool,
    needs_update: bool,
    force_apply: bool,
    limiter: RateLimiter,
}

impl PresetController<NoReplication> {
    pub fn new(table: PresetTable) -> Self {
        Self::with_replicator(table, NoReplication)
    }
}

impl Default for PresetController<NoReplication> {
    fn default() -> Self {
        Self::new(PresetTable::default())
    }
}

impl<R: Replicator> PresetController<R> {
    /// Start on the default preset as the authoritative owner
    pub fn with_replicator(table: PresetTable, replicator: R) -> Self {
        let index = table.clamp_index(limits::DEFAULT_INDEX);
        let state = PresetState::from_preset(index, select_preset(&table, index));

        info!(
            presets = table.len(),
            preset = %select_preset(&table, index).name,
            "preset controller initialized"
        );

        Self {
            table,
            state,
            replicator,
            is_owner: true,
            needs_update: true,
            force_apply: false,
            limiter: RateLimiter::new(Duration::from_millis(limits::UPDATE_INTERVAL_MS)),
        }
    }

    pub fn set_update_interval(&mut self, interval: Duration) {
        self.limiter.set_interval(interval);
    }

    pub fn set_owner(&mut self, is_owner: bool) {
        self.is_owner = is_owner;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn state(&self) -> &PresetState {
        &self.state
    }

    pub fn replicator(&self) -> &R {
        &self.replicator
    }

    /// Material output for the current live state
    pub fn material_params(&self) -> MaterialParams {
        self.state.material_params()
    }

    /// Rate-limited apply. Local changes wait for the interval, a received
    /// snapshot applies on the next tick. With no pending change nothing is
    /// materialized.
    pub fn tick(&mut self, now: Duration) -> Option<MaterialParams> {
        if !self.needs_update || !self.limiter.ready(now, self.force_apply) {
            return None;
        }

        let params = self.material_params();
        self.needs_update = false;
        self.force_apply = false;
        self.limiter.mark(now);

        debug!(
            al_gain = params.al_gain,
            emission_gain = params.emission_gain,
            smoothing = params.al_smoothing,
            safe_mode = params.safe_mode,
            "material parameters applied"
        );
        Some(params)
    }

    /// Switch presets, discarding manual tuning. Returns whether anything changed.
    pub fn set_preset(&mut self, index: usize) -> bool {
        let index = self.table.clamp_index(index);
        if index == self.state.current_index {
            return false;
        }

        self.state = PresetState::from_preset(index, select_preset(&self.table, index));
        self.changed();

        info!(preset = %self.current_preset_name(), "switched preset");
        true
    }

    pub fn next_preset(&mut self) -> bool {
        let next = (self.state.current_index + 1) % self.table.len();
        self.set_preset(next)
    }

    pub fn previous_preset(&mut self) -> bool {
        let len = self.table.len();
        let previous = (self.state.current_index + len - 1) % len;
        self.set_preset(previous)
    }

    pub fn set_master_gain(&mut self, value: f32) -> bool {
        let Some(value) = clamp_setting(
            "master_gain",
            value,
            limits::MASTER_GAIN_MIN,
            limits::MASTER_GAIN_MAX,
        ) else {
            return false;
        };
        if (self.state.master_gain - value).abs() <= limits::CHANGE_EPSILON {
            return false;
        }
        self.state.master_gain = value;
        self.changed();
        true
    }

    pub fn set_emission_gain(&mut self, value: f32) -> bool {
        let Some(value) = clamp_setting(
            "emission_gain",
            value,
            limits::EMISSION_GAIN_MIN,
            limits::EMISSION_GAIN_MAX,
        ) else {
            return false;
        };
        if (self.state.emission_gain - value).abs() <= limits::CHANGE_EPSILON {
            return false;
        }
        self.state.emission_gain = value;
        self.changed();
        true
    }

    pub fn set_smoothing(&mut self, value: f32) -> bool {
        let Some(value) = clamp_setting(
            "smoothing",
            value,
            limits::SMOOTHING_MIN,
            limits::SMOOTHING_MAX,
        ) else {
            return false;
        };
        if (self.state.smoothing - value).abs() <= limits::CHANGE_EPSILON {
            return false;
        }
        self.state.smoothing = value;
        self.changed();
        true
    }

    pub fn set_safe_mode(&mut self, enabled: bool) -> bool {
        if self.state.safe_mode == enabled {
            return false;
        }
        self.state.safe_mode = enabled;
        self.changed();
        info!(enabled, "safe mode changed");
        true
    }

    pub fn set_beat_pulse(&mut self, enabled: bool) -> bool {
        if self.state.beat_pulse == enabled {
            return false;
        }
        self.state.beat_pulse = enabled;
        self.changed();
        info!(enabled, "beat pulse changed");
        true
    }

    pub fn toggle_safe_mode(&mut self) -> bool {
        self.set_safe_mode(!self.state.safe_mode)
    }

    pub fn toggle_beat_pulse(&mut self) -> bool {
        self.set_beat_pulse(!self.state.beat_pulse)
    }

    /// Accept a replicated snapshot. Applied on the next tick, never echoed back.
    pub fn on_deserialization(&mut self, snapshot: PresetState) {
        self.state = snapshot.sanitized(&self.table);
        self.needs_update = true;
        self.force_apply = true;
        debug!(index = self.state.current_index, "received preset snapshot");
    }

    pub fn current_preset(&self) -> &Preset {
        select_preset(&self.table, self.state.current_index)
    }

    pub fn current_preset_name(&self) -> &str {
        &self.current_preset().name
    }

    fn changed(&mut self) {
        self.needs_update = true;
        if self.is_owner {
            self.replicator.replicate(&self.state);
        }
    }
}
