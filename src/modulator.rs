//! Particle consumer: turns spectrum bands into emission, speed and size

use crate::constants::{audio, idle, particle, smoothing};
use crate::error::PipelineError;
use crate::levels::idle_level;
use crate::smoothing::LevelSmoother;
use crate::spectrum::{Band, band_levels};
use crate::throttle::RateLimiter;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tunable settings of a [`ParticleModulator`]
#[derive(Debug, Clone, PartialEq)]
pub struct ModulatorSettings {
    pub base_emission_rate: f32,
    pub emission_rate_gain: f32,
    pub base_start_speed: f32,
    pub start_speed_gain: f32,
    pub base_start_size: f32,
    pub start_size_gain: f32,
    pub coefficient: f32,
    pub idle_floor: f32,
    pub max_level: f32,
    pub normalizer_gain: f32,
    pub emission_band: Band,
    pub speed_band: Band,
    pub size_band: Band,
    pub update_interval: Duration,
}

impl Default for ModulatorSettings {
    fn default() -> Self {
        Self {
            base_emission_rate: particle::BASE_EMISSION_RATE,
            emission_rate_gain: particle::EMISSION_RATE_GAIN,
            base_start_speed: particle::BASE_START_SPEED,
            start_speed_gain: particle::START_SPEED_GAIN,
            base_start_size: particle::BASE_START_SIZE,
            start_size_gain: particle::START_SIZE_GAIN,
            coefficient: smoothing::DEFAULT_COEFFICIENT,
            idle_floor: smoothing::IDLE_FLOOR,
            max_level: smoothing::MAX_LEVEL,
            normalizer_gain: audio::NORMALIZER_GAIN,
            emission_band: Band::Bass,
            speed_band: Band::HighMid,
            size_band: Band::Bass,
            update_interval: Duration::from_millis(particle::UPDATE_INTERVAL_MS),
        }
    }
}

/// Smoothed activity of the three particle channels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityLevels {
    pub emission: f32,
    pub speed: f32,
    pub size: f32,
}

/// Parameters handed to the particle system each applied tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleParams {
    pub emission_rate: f32,
    pub start_speed: f32,
    pub start_size: f32,
    pub noise_strength: f32,
}

/// Clamp a setter value into `[min, max]`, rejecting NaN
pub(crate) fn clamp_setting(name: &str, value: f32, min: f32, max: f32) -> Option<f32> {
    if value.is_nan() {
        warn!(setting = name, "ignoring NaN value");
        return None;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        debug!(setting = name, value, clamped, "value clamped to range");
    }
    Some(clamped)
}

pub struct ParticleModulator {
    settings: ModulatorSettings,
    use_audio_data: bool,
    emission: LevelSmoother,
    speed: LevelSmoother,
    size: LevelSmoother,
    limiter: RateLimiter,
    applied_updates: u64,
}

impl ParticleModulator {
    pub fn new(mut settings: ModulatorSettings) -> Self {
        settings.coefficient = clamp_setting(
            "ema_coefficient",
            settings.coefficient,
            smoothing::COEFFICIENT_MIN,
            smoothing::COEFFICIENT_MAX,
        )
        .unwrap_or(smoothing::DEFAULT_COEFFICIENT);

        let smoother = LevelSmoother::new(settings.idle_floor, settings.max_level);
        let limiter = RateLimiter::new(settings.update_interval);

        info!(
            coefficient = settings.coefficient,
            idle_floor = smoother.idle_floor(),
            max_level = smoother.max_level(),
            "particle modulator initialized"
        );

        Self {
            settings,
            use_audio_data: false,
            emission: smoother.clone(),
            speed: smoother.clone(),
            size: smoother,
            limiter,
            applied_updates: 0,
        }
    }

    /// Rate-limited update. Returns `None` when the tick was skipped.
    pub fn tick(
        &mut self,
        now: Duration,
        spectrum: Option<&[f32]>,
    ) -> Result<Option<ParticleParams>, PipelineError> {
        if !self.limiter.ready(now, false) {
            return Ok(None);
        }
        let params = self.process(now, spectrum)?;
        self.limiter.mark(now);
        Ok(Some(params))
    }

    /// Run one smoothing step regardless of timing.
    ///
    /// `spectrum` is only used while live input is enabled; otherwise, or
    /// when it is `None`, each channel follows the idle oscillator.
    pub fn process(
        &mut self,
        now: Duration,
        spectrum: Option<&[f32]>,
    ) -> Result<ParticleParams, PipelineError> {
        let targets = self.targets(now, spectrum);
        let c = self.settings.coefficient;

        self.emission.update(targets.emission, c)?;
        self.speed.update(targets.speed, c)?;
        self.size.update(targets.size, c)?;

        self.applied_updates += 1;
        if self.applied_updates % particle::LOG_EVERY_UPDATES == 0 {
            debug!(
                emission = self.emission.value(),
                speed = self.speed.value(),
                size = self.size.value(),
                "particle levels"
            );
        }

        Ok(self.params())
    }

    fn targets(&self, now: Duration, spectrum: Option<&[f32]>) -> ActivityLevels {
        match spectrum {
            Some(buffer) if self.use_audio_data => {
                let bands = band_levels(buffer, self.settings.normalizer_gain);
                ActivityLevels {
                    emission: bands[self.settings.emission_band.index()],
                    speed: bands[self.settings.speed_band.index()],
                    size: bands[self.settings.size_band.index()],
                }
            }
            _ => {
                let t = now.as_secs_f32();
                let floor = self.emission.idle_floor();
                ActivityLevels {
                    emission: idle_level(t, idle::EMISSION_PHASE, floor),
                    speed: idle_level(t, idle::SPEED_PHASE, floor),
                    size: idle_level(t, idle::SIZE_PHASE, floor),
                }
            }
        }
    }

    /// Particle parameters for the current smoothed levels
    pub fn params(&self) -> ParticleParams {
        let s = &self.settings;
        let levels = self.levels();
        ParticleParams {
            emission_rate: s.base_emission_rate + levels.emission * s.emission_rate_gain,
            start_speed: s.base_start_speed + levels.speed * s.start_speed_gain,
            start_size: s.base_start_size + levels.size * s.start_size_gain,
            noise_strength: levels.speed * particle::NOISE_PER_SPEED,
        }
    }

    pub fn levels(&self) -> ActivityLevels {
        ActivityLevels {
            emission: self.emission.value(),
            speed: self.speed.value(),
            size: self.size.value(),
        }
    }

    /// Put every channel back on the idle floor
    pub fn reset_to_idle(&mut self) -> ParticleParams {
        self.emission.reset();
        self.speed.reset();
        self.size.reset();
        info!("particle modulator reset to idle");
        self.params()
    }

    pub fn set_use_audio_data(&mut self, enabled: bool) {
        if self.use_audio_data != enabled {
            info!(enabled, "audio data mode changed");
        }
        self.use_audio_data = enabled;
    }

    pub fn set_ema_coefficient(&mut self, coefficient: f32) {
        if let Some(c) = clamp_setting(
            "ema_coefficient",
            coefficient,
            smoothing::COEFFICIENT_MIN,
            smoothing::COEFFICIENT_MAX,
        ) {
            self.settings.coefficient = c;
        }
    }

    pub fn set_base_emission_rate(&mut self, rate: f32) {
        if let Some(v) = clamp_setting("base_emission_rate", rate, 0.0, f32::INFINITY) {
            self.settings.base_emission_rate = v;
        }
    }

    pub fn set_emission_rate_gain(&mut self, gain: f32) {
        if let Some(v) =
            clamp_setting("emission_rate_gain", gain, 0.0, particle::EMISSION_RATE_GAIN_MAX)
        {
            self.settings.emission_rate_gain = v;
        }
    }

    pub fn set_base_start_speed(&mut self, speed: f32) {
        if let Some(v) = clamp_setting("base_start_speed", speed, 0.0, f32::INFINITY) {
            self.settings.base_start_speed = v;
        }
    }

    pub fn set_start_speed_gain(&mut self, gain: f32) {
        if let Some(v) =
            clamp_setting("start_speed_gain", gain, 0.0, particle::START_SPEED_GAIN_MAX)
        {
            self.settings.start_speed_gain = v;
        }
    }

    pub fn set_base_start_size(&mut self, size: f32) {
        if let Some(v) = clamp_setting(
            "base_start_size",
            size,
            particle::BASE_START_SIZE_MIN,
            f32::INFINITY,
        ) {
            self.settings.base_start_size = v;
        }
    }

    pub fn set_start_size_gain(&mut self, gain: f32) {
        if let Some(v) = clamp_setting("start_size_gain", gain, 0.0, particle::START_SIZE_GAIN_MAX)
        {
            self.settings.start_size_gain = v;
        }
    }

    pub fn emission_level(&self) -> f32 {
        self.emission.value()
    }

    pub fn speed_level(&self) -> f32 {
        self.speed.value()
    }

    pub fn size_level(&self) -> f32 {
        self.size.value()
    }

    pub fn is_using_audio_data(&self) -> bool {
        self.use_audio_data
    }

    pub fn settings(&self) -> &ModulatorSettings {
        &self.settings
    }
}

impl Default for ParticleModulator {
    fn default() -> Self {
        Self::new(ModulatorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::audio::SPECTRUM_SIZE;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_starts_on_idle_floor() {
        let modulator = ParticleModulator::default();
        let levels = modulator.levels();
        assert_eq!(levels.emission, 0.1);
        assert_eq!(levels.speed, 0.1);
        assert_eq!(levels.size, 0.1);
        assert!(!modulator.is_using_audio_data());
    }

    #[test]
    fn test_silent_spectrum_settles_on_floor() {
        let mut modulator = ParticleModulator::default();
        modulator.set_use_audio_data(true);
        let silence = vec![0.0; SPECTRUM_SIZE];
        for i in 0..400 {
            modulator.process(ms(i * 50), Some(&silence)).unwrap();
            assert!(modulator.emission_level() >= 0.1);
        }
        assert!((modulator.emission_level() - 0.1).abs() < 1e-6);
        let params = modulator.params();
        assert!((params.emission_rate - 12.0).abs() < 1e-4);
        assert!((params.start_speed - 1.2).abs() < 1e-4);
        assert!((params.start_size - 1.05).abs() < 1e-4);
        assert!((params.noise_strength - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_loud_bass_drives_emission_and_size_not_speed() {
        let mut modulator = ParticleModulator::default();
        modulator.set_use_audio_data(true);
        let mut spectrum = vec![0.0; SPECTRUM_SIZE];
        for bin in &mut spectrum[0..16] {
            *bin = 0.05;
        }
        for i in 0..200 {
            modulator.process(ms(i * 50), Some(&spectrum)).unwrap();
        }
        assert!((modulator.emission_level() - 1.0).abs() < 1e-4);
        assert!((modulator.size_level() - 1.0).abs() < 1e-4);
        assert!((modulator.speed_level() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_spectrum_ignored_when_audio_disabled() {
        let mut modulator = ParticleModulator::default();
        let loud = vec![1.0; SPECTRUM_SIZE];
        for i in 0..200 {
            modulator.process(ms(i * 50), Some(&loud)).unwrap();
        }
        let levels = modulator.levels();
        for level in [levels.emission, levels.speed, levels.size] {
            assert!((0.1..=0.3 + 1e-6).contains(&level), "level={level}");
        }
    }

    #[test]
    fn test_missing_input_falls_back_to_idle() {
        let mut modulator = ParticleModulator::default();
        modulator.set_use_audio_data(true);
        for i in 0..200 {
            modulator.process(ms(i * 50), None).unwrap();
        }
        assert!(modulator.emission_level() <= 0.3 + 1e-6);
        assert!(modulator.emission_level() >= 0.1);
    }

    #[test]
    fn test_tick_is_rate_limited() {
        let mut modulator = ParticleModulator::default();
        assert!(modulator.tick(ms(0), None).unwrap().is_some());
        assert!(modulator.tick(ms(20), None).unwrap().is_none());
        assert!(modulator.tick(ms(49), None).unwrap().is_none());
        assert!(modulator.tick(ms(50), None).unwrap().is_some());
    }

    #[test]
    fn test_setters_clamp() {
        let mut modulator = ParticleModulator::default();
        modulator.set_ema_coefficient(0.9);
        assert_eq!(modulator.settings().coefficient, 0.5);
        modulator.set_ema_coefficient(0.0);
        assert_eq!(modulator.settings().coefficient, 0.05);
        modulator.set_base_emission_rate(-4.0);
        assert_eq!(modulator.settings().base_emission_rate, 0.0);
        modulator.set_emission_rate_gain(500.0);
        assert_eq!(modulator.settings().emission_rate_gain, 100.0);
        modulator.set_base_start_speed(-1.0);
        assert_eq!(modulator.settings().base_start_speed, 0.0);
        modulator.set_start_speed_gain(11.0);
        assert_eq!(modulator.settings().start_speed_gain, 10.0);
        modulator.set_base_start_size(0.0);
        assert_eq!(modulator.settings().base_start_size, 0.1);
        modulator.set_start_size_gain(-2.0);
        assert_eq!(modulator.settings().start_size_gain, 0.0);
        modulator.set_base_emission_rate(1e6);
        assert_eq!(modulator.settings().base_emission_rate, 1e6);
    }

    #[test]
    fn test_nan_setter_is_ignored() {
        let mut modulator = ParticleModulator::default();
        modulator.set_ema_coefficient(f32::NAN);
        assert_eq!(modulator.settings().coefficient, 0.15);
    }

    #[test]
    fn test_constructor_clamps_coefficient() {
        let modulator = ParticleModulator::new(ModulatorSettings {
            coefficient: 3.0,
            ..ModulatorSettings::default()
        });
        assert_eq!(modulator.settings().coefficient, 0.5);
    }

    #[test]
    fn test_reset_to_idle() {
        let mut modulator = ParticleModulator::default();
        modulator.set_use_audio_data(true);
        let loud = vec![1.0; SPECTRUM_SIZE];
        for i in 0..50 {
            modulator.process(ms(i * 50), Some(&loud)).unwrap();
        }
        assert!(modulator.emission_level() > 0.5);
        let params = modulator.reset_to_idle();
        assert_eq!(modulator.levels().emission, 0.1);
        assert!((params.emission_rate - 12.0).abs() < 1e-4);
    }
}
