//! Audio-reactive modulation for particle systems and materials.
//!
//! The pipeline runs once per tick: spectrum bands are extracted and
//! normalized (or replaced by an idle waveform when there is no live input),
//! smoothed per channel, clamped, and mapped onto consumer parameters.
//! Presets drive a second consumer through a replicated [`preset::PresetState`].

pub mod app;
pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod levels;
pub mod logging;
pub mod modulator;
pub mod preset;
pub mod smoothing;
pub mod spectrum;
pub mod state;
pub mod throttle;
pub mod ui;

pub use error::{AppError, AppResult, PipelineError};
pub use levels::{idle_level, normalize};
pub use modulator::{ActivityLevels, ModulatorSettings, ParticleModulator, ParticleParams};
pub use preset::{
    MaterialParams, Preset, PresetController, PresetState, PresetTable, Replicator, select_preset,
};
pub use smoothing::{LevelSmoother, step};
pub use spectrum::{Band, BandRange, SpectrumAnalyzer, band_level, band_levels};
pub use throttle::RateLimiter;
