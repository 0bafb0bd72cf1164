//! Application constants and configuration values

/// Audio input and spectrum constants
pub mod audio {
    /// Number of magnitude bins in a spectrum buffer
    pub const SPECTRUM_SIZE: usize = 256;
    /// FFT length used to produce `SPECTRUM_SIZE` bins
    pub const FFT_SIZE: usize = SPECTRUM_SIZE * 2;
    /// Gain applied to raw band averages before clamping to [0, 1]
    pub const NORMALIZER_GAIN: f32 = 100.0;
    /// Preferred capture sample rate
    pub const PREFERRED_SAMPLE_RATE: u32 = 44100;
    /// Number of channels to request from the input device
    pub const DEFAULT_CHANNELS: u16 = 1;
    /// Buffer size for audio streams
    pub const BUFFER_SIZE: cpal::BufferSize = cpal::BufferSize::Default;
    /// Samples retained in the capture ring
    pub const RING_CAPACITY: usize = FFT_SIZE * 4;
}

/// Activity level and smoothing constants
pub mod smoothing {
    /// Default EMA coefficient for the particle consumer
    pub const DEFAULT_COEFFICIENT: f32 = 0.15;
    /// Clamp range for the particle smoothing coefficient setter
    pub const COEFFICIENT_MIN: f32 = 0.05;
    pub const COEFFICIENT_MAX: f32 = 0.5;
    /// Lowest activity level a smoother will hold
    pub const IDLE_FLOOR: f32 = 0.1;
    /// Highest activity level a smoother will hold
    pub const MAX_LEVEL: f32 = 1.0;
    /// Height of the idle oscillator above the floor
    pub const IDLE_SPAN: f32 = 0.2;
}

/// Idle oscillator phases per particle channel
pub mod idle {
    pub const EMISSION_PHASE: f32 = 0.5;
    pub const SPEED_PHASE: f32 = 0.7;
    pub const SIZE_PHASE: f32 = 0.3;
}

/// Particle consumer defaults and setter ranges
pub mod particle {
    pub const BASE_EMISSION_RATE: f32 = 10.0;
    pub const EMISSION_RATE_GAIN: f32 = 20.0;
    pub const EMISSION_RATE_GAIN_MAX: f32 = 100.0;
    pub const BASE_START_SPEED: f32 = 1.0;
    pub const START_SPEED_GAIN: f32 = 2.0;
    pub const START_SPEED_GAIN_MAX: f32 = 10.0;
    pub const BASE_START_SIZE: f32 = 1.0;
    pub const BASE_START_SIZE_MIN: f32 = 0.1;
    pub const START_SIZE_GAIN: f32 = 0.5;
    pub const START_SIZE_GAIN_MAX: f32 = 5.0;
    /// Noise strength per unit of speed level
    pub const NOISE_PER_SPEED: f32 = 0.5;
    /// Minimum time between applied particle updates (20 Hz)
    pub const UPDATE_INTERVAL_MS: u64 = 50;
    pub const MAX_UPDATE_INTERVAL_MS: u64 = 60_000;
    /// Applied updates between two level log lines
    pub const LOG_EVERY_UPDATES: u64 = 60;
}

/// Preset and material constants
pub mod preset {
    pub const MASTER_GAIN_MIN: f32 = 0.0;
    pub const MASTER_GAIN_MAX: f32 = 2.0;
    pub const EMISSION_GAIN_MIN: f32 = 0.0;
    pub const EMISSION_GAIN_MAX: f32 = 3.0;
    pub const SMOOTHING_MIN: f32 = 0.05;
    pub const SMOOTHING_MAX: f32 = 0.5;
    /// Setter changes smaller than this are ignored
    pub const CHANGE_EPSILON: f32 = 0.01;
    /// Index of the preset active at startup
    pub const DEFAULT_INDEX: usize = 1;
    /// Minimum time between applied material updates (10 Hz)
    pub const UPDATE_INTERVAL_MS: u64 = 100;
    pub const MAX_UPDATE_INTERVAL_MS: u64 = 60_000;
    /// Step used by the interactive master gain keys
    pub const MASTER_GAIN_STEP: f32 = 0.1;
}

/// Safe-mode output transform
pub mod safe_mode {
    pub const GAIN_SCALE: f32 = 1.2;
    pub const GAIN_MIN: f32 = 0.5;
    pub const GAIN_MAX: f32 = 1.8;
    pub const EMISSION_SCALE: f32 = 0.8;
    pub const EMISSION_MIN: f32 = 0.3;
    pub const EMISSION_MAX: f32 = 1.2;
    pub const SMOOTHING_OFFSET: f32 = 0.1;
    pub const SMOOTHING_MIN: f32 = 0.15;
    pub const SMOOTHING_MAX: f32 = 0.4;
    /// Gain multiplier outside safe mode
    pub const UNSAFE_GAIN_SCALE: f32 = 1.5;
}

/// UI display constants
pub mod ui {
    /// UI update interval in milliseconds
    pub const UPDATE_INTERVAL_MS: u64 = 10;
    /// Bar width calculation accounts for borders
    pub const BAR_BORDER_WIDTH: usize = 2;
}
