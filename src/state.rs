//! Application state management

use crate::constants::audio::RING_CAPACITY;
use crate::modulator::{ActivityLevels, ParticleParams};
use crate::preset::{MaterialParams, PresetState};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Internal application state shown by the UI
pub struct AppState {
    pub device_name: String,
    pub status: String,
    pub use_audio: bool,
    pub audio_available: bool,
    pub levels: ActivityLevels,
    pub particle: ParticleParams,
    pub preset_name: String,
    pub preset: PresetState,
    pub material: MaterialParams,
}

impl AppState {
    /// Create a new application state with default values
    pub fn new(device_name: String, preset_name: String, preset: PresetState) -> Self {
        let material = preset.material_params();
        Self {
            device_name,
            status: String::new(),
            use_audio: false,
            audio_available: false,
            levels: ActivityLevels::default(),
            particle: ParticleParams::default(),
            preset_name,
            preset,
            material,
        }
    }

    /// Refresh the status line from the current input mode
    pub fn update_status(&mut self) {
        self.status = match (self.use_audio, self.audio_available) {
            (true, true) => "Live input".to_string(),
            (true, false) => "Live input requested, no signal: idling".to_string(),
            (false, _) => "Idle animation".to_string(),
        };
    }
}

/// Thread-safe buffer of the most recent captured samples
#[derive(Clone)]
pub struct SharedState {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl SharedState {
    /// Create new shared state with an empty ring
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(RING_CAPACITY))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<f32>> {
        // A panicked writer leaves plain samples behind, still safe to read
        self.samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append samples, dropping the oldest beyond capacity
    pub fn push_samples(&self, data: &[f32]) {
        let mut ring = self.lock();
        ring.extend(data.iter().copied());
        let excess = ring.len().saturating_sub(RING_CAPACITY);
        ring.drain(..excess);
    }

    /// Copy the newest `count` samples into `out`; returns false when fewer are buffered
    pub fn latest(&self, count: usize, out: &mut Vec<f32>) -> bool {
        let ring = self.lock();
        out.clear();
        if ring.len() < count {
            return false;
        }
        out.extend(ring.iter().skip(ring.len() - count).copied());
        true
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_drops_oldest_samples() {
        let shared = SharedState::new();
        let first = vec![1.0; RING_CAPACITY];
        shared.push_samples(&first);
        shared.push_samples(&[2.0, 3.0]);

        let mut out = Vec::new();
        assert!(!shared.latest(RING_CAPACITY + 1, &mut out));
        assert!(shared.latest(RING_CAPACITY, &mut out));
        assert_eq!(out.len(), RING_CAPACITY);
        assert!(shared.latest(3, &mut out));
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_latest_requires_enough_samples() {
        let shared = SharedState::new();
        shared.push_samples(&[0.5; 10]);
        let mut out = vec![9.0];
        assert!(!shared.latest(11, &mut out));
        assert!(out.is_empty());
        assert!(shared.latest(10, &mut out));
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn test_status_reflects_input_mode() {
        let preset = PresetState {
            current_index: 1,
            master_gain: 1.0,
            emission_gain: 1.0,
            smoothing: 0.15,
            safe_mode: false,
            beat_pulse: true,
        };
        let mut state = AppState::new("mic".to_string(), "Default".to_string(), preset);
        state.update_status();
        assert_eq!(state.status, "Idle animation");
        state.use_audio = true;
        state.update_status();
        assert!(state.status.contains("idling"));
        state.audio_available = true;
        state.update_status();
        assert_eq!(state.status, "Live input");
    }
}
