//! Configuration parsing and validation

use crate::constants::{particle, preset, smoothing};
use crate::error::PipelineError;
use crate::modulator::ModulatorSettings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for the almod application
#[derive(Parser)]
#[command(name = "almod")]
#[command(about = "Audio-reactive particle and material modulation")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive the modulators live and show their output
    Run(RunArgs),
    /// List available audio input devices
    List(ListArgs),
    /// Print the preset table and the material output of each preset
    Presets(PresetsArgs),
    /// Run the pipeline headless for a fixed number of ticks
    Simulate(SimulateArgs),
}

/// Settings shared by every command that runs the pipeline
#[derive(clap::Args, Clone)]
pub struct PipelineArgs {
    /// EMA smoothing coefficient (0.05 - 0.5)
    #[arg(long, default_value_t = smoothing::DEFAULT_COEFFICIENT)]
    pub coefficient: f32,

    /// Lowest activity level the smoothers hold
    #[arg(long, default_value_t = smoothing::IDLE_FLOOR)]
    pub idle_floor: f32,

    /// Highest activity level the smoothers hold
    #[arg(long, default_value_t = smoothing::MAX_LEVEL)]
    pub max_level: f32,

    /// Preset to start on (0 = Calm, 1 = Default, 2 = Hype)
    #[arg(long, default_value_t = preset::DEFAULT_INDEX)]
    pub preset: usize,

    /// Minimum time between particle updates in milliseconds
    #[arg(long, default_value_t = particle::UPDATE_INTERVAL_MS)]
    pub particle_interval_ms: u64,

    /// Minimum time between material updates in milliseconds
    #[arg(long, default_value_t = preset::UPDATE_INTERVAL_MS)]
    pub material_interval_ms: u64,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Audio input device name (optional, uses default if not specified)
    #[arg(long)]
    pub device: Option<String>,

    /// Start with live audio input enabled
    #[arg(long)]
    pub audio: bool,

    /// Write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Number of particle ticks to run
    #[arg(long, default_value_t = 40)]
    pub ticks: usize,

    /// Feed a synthetic sine tone of this frequency in Hz instead of idling
    #[arg(long)]
    pub tone: Option<f32>,

    /// Peak amplitude of the synthetic tone
    #[arg(long, default_value_t = 0.5)]
    pub amplitude: f32,

    /// Output only the numeric columns without labels
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Parser)]
pub struct PresetsArgs {}

#[derive(Parser)]
pub struct ListArgs {}

/// Application configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub modulator: ModulatorSettings,
    pub preset_index: usize,
    pub material_interval: Duration,
    pub use_audio: bool,
    pub device_name: Option<String>,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
}

/// Configuration for a headless simulation
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub pipeline: Config,
    pub ticks: usize,
    pub tone_hz: Option<f32>,
    pub amplitude: f32,
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<f32, PipelineError> {
    if value.is_nan() || value < min || value > max {
        return Err(PipelineError::ConfigurationOutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn check_interval(
    name: &'static str,
    ms: u64,
    min: u64,
    max: u64,
) -> Result<Duration, PipelineError> {
    if ms < min || ms > max {
        return Err(PipelineError::ConfigurationOutOfRange {
            name,
            value: ms as f32,
            min: min as f32,
            max: max as f32,
        });
    }
    Ok(Duration::from_millis(ms))
}

impl Config {
    fn from_pipeline_args(args: &PipelineArgs) -> Result<Self, PipelineError> {
        let coefficient = check_range(
            "coefficient",
            args.coefficient,
            smoothing::COEFFICIENT_MIN,
            smoothing::COEFFICIENT_MAX,
        )?;
        let idle_floor = check_range("idle floor", args.idle_floor, 0.0, 1.0)?;
        let max_level = check_range("max level", args.max_level, idle_floor, 1.0)?;

        let particle_interval = check_interval(
            "particle interval",
            args.particle_interval_ms,
            1,
            particle::MAX_UPDATE_INTERVAL_MS,
        )?;
        let material_interval = check_interval(
            "material interval",
            args.material_interval_ms,
            0,
            preset::MAX_UPDATE_INTERVAL_MS,
        )?;

        let modulator = ModulatorSettings {
            coefficient,
            idle_floor,
            max_level,
            update_interval: particle_interval,
            ..ModulatorSettings::default()
        };

        Ok(Config {
            modulator,
            preset_index: args.preset,
            material_interval,
            use_audio: false,
            device_name: None,
            log_file: None,
            debug: args.debug,
        })
    }

    /// Create configuration from run arguments
    pub fn from_run_args(run_args: RunArgs) -> Result<Self, PipelineError> {
        let mut config = Self::from_pipeline_args(&run_args.pipeline)?;
        config.use_audio = run_args.audio;
        config.device_name = run_args.device;
        config.log_file = run_args.log_file;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            modulator: ModulatorSettings::default(),
            preset_index: preset::DEFAULT_INDEX,
            material_interval: Duration::from_millis(preset::UPDATE_INTERVAL_MS),
            use_audio: false,
            device_name: None,
            log_file: None,
            debug: false,
        }
    }
}

impl SimulationConfig {
    /// Create configuration from simulate arguments
    pub fn from_simulate_args(args: &SimulateArgs) -> Result<Self, PipelineError> {
        let mut pipeline = Config::from_pipeline_args(&args.pipeline)?;

        let tone_hz = match args.tone {
            Some(hz) => Some(check_range("tone frequency", hz, 1.0, 20_000.0)?),
            None => None,
        };
        let amplitude = check_range("amplitude", args.amplitude, 0.0, 1.0)?;
        pipeline.use_audio = tone_hz.is_some();

        Ok(SimulationConfig {
            pipeline,
            ticks: args.ticks,
            tone_hz,
            amplitude,
        })
    }
}
