//! Main application logic and orchestration

use crate::audio;
use crate::config::{Config, SimulationConfig};
use crate::constants::audio::{FFT_SIZE, PREFERRED_SAMPLE_RATE};
use crate::constants::preset::MASTER_GAIN_STEP;
use crate::error::{AppError, AppResult};
use crate::modulator::{ActivityLevels, ParticleModulator, ParticleParams};
use crate::preset::{
    MaterialParams, PresetController, PresetState, PresetTable, Replicator,
};
use crate::spectrum::SpectrumAnalyzer;
use crate::state::{AppState, SharedState};
use crate::ui;
use cpal::traits::StreamTrait;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::f32::consts::TAU;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Main application struct
pub struct App {
    config: Config,
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
}

/// Exit codes for the application
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Success = 0,
    Error = 2,
}

/// Result type that includes user exit information
pub type AppRunResult = Result<(), AppError>;

/// Extended result that tracks exit reason
pub struct RunResult {
    pub result: AppRunResult,
    pub exit_code: ExitCode,
}

/// Stands in for network serialization: records each owner snapshot in the log
pub struct LogReplicator;

impl Replicator for LogReplicator {
    fn replicate(&mut self, state: &PresetState) {
        debug!(?state, "replicating preset state");
    }
}

/// Apply a key press to the modulators. Returns true when the user asked to quit.
pub fn handle_key<R: Replicator>(
    key: KeyEvent,
    modulator: &mut ParticleModulator,
    presets: &mut PresetController<R>,
) -> bool {
    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('a') => modulator.set_use_audio_data(!modulator.is_using_audio_data()),
        KeyCode::Char('r') => {
            modulator.reset_to_idle();
        }
        KeyCode::Char('n') => {
            presets.next_preset();
        }
        KeyCode::Char('p') => {
            presets.previous_preset();
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            presets.set_preset(index);
        }
        KeyCode::Char('s') => {
            presets.toggle_safe_mode();
        }
        KeyCode::Char('b') => {
            presets.toggle_beat_pulse();
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let gain = presets.state().master_gain + MASTER_GAIN_STEP;
            presets.set_master_gain(gain);
        }
        KeyCode::Char('-') => {
            let gain = presets.state().master_gain - MASTER_GAIN_STEP;
            presets.set_master_gain(gain);
        }
        _ => {}
    }
    false
}

/// Build the preset controller for a configuration
pub fn preset_controller<R: Replicator>(config: &Config, replicator: R) -> PresetController<R> {
    let mut presets = PresetController::with_replicator(PresetTable::default(), replicator);
    presets.set_update_interval(config.material_interval);
    presets.set_preset(config.preset_index);
    presets
}

impl App {
    /// Initialize the application with configuration
    pub fn new_with_config(config: Config) -> AppResult<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(App { config, terminal })
    }

    /// Open the capture stream. Failure leaves the app on the idle animation.
    fn start_input(&self, shared: &SharedState) -> (String, Option<cpal::Stream>) {
        let opened = audio::setup_audio_device(self.config.device_name.clone()).and_then(
            |(device, audio_config)| {
                let stream_config = cpal::StreamConfig {
                    channels: audio_config.channels,
                    sample_rate: cpal::SampleRate(audio_config.sample_rate),
                    buffer_size: crate::constants::audio::BUFFER_SIZE,
                };
                let callback = audio::create_audio_callback(shared.clone(), audio_config.channels);
                let stream = audio::build_audio_stream(&device, &stream_config, callback)?;
                stream.play()?;
                Ok((audio_config.device_name, stream))
            },
        );

        match opened {
            Ok((name, stream)) => (name, Some(stream)),
            Err(e) => {
                warn!(error = %e, "no live input, falling back to idle animation");
                ("No input device".to_string(), None)
            }
        }
    }

    /// Run the main application loop
    pub async fn run(mut self) -> RunResult {
        let result = self.run_loop().await;
        let _ = self.cleanup();

        let exit_code = match result {
            Ok(()) => ExitCode::Success,
            Err(_) => ExitCode::Error,
        };
        RunResult { result, exit_code }
    }

    async fn run_loop(&mut self) -> AppRunResult {
        let shared = SharedState::new();
        let (device_name, stream) = self.start_input(&shared);

        let mut modulator = ParticleModulator::new(self.config.modulator.clone());
        modulator.set_use_audio_data(self.config.use_audio);
        let mut presets = preset_controller(&self.config, LogReplicator);

        let mut app_state = AppState::new(
            device_name,
            presets.current_preset_name().to_string(),
            presets.state().clone(),
        );
        let mut analyzer = SpectrumAnalyzer::new();
        let mut window = Vec::with_capacity(FFT_SIZE);

        info!(preset = %presets.current_preset_name(), "modulation started");

        let start = Instant::now();
        let mut interval =
            tokio::time::interval(Duration::from_millis(crate::constants::ui::UPDATE_INTERVAL_MS));

        loop {
            let now = start.elapsed();

            let audio_available = stream.is_some() && shared.latest(FFT_SIZE, &mut window);
            let spectrum = if modulator.is_using_audio_data() && audio_available {
                Some(analyzer.analyze(&window))
            } else {
                None
            };

            if modulator.tick(now, spectrum)?.is_some() {
                app_state.levels = modulator.levels();
                app_state.particle = modulator.params();
            }
            if let Some(material) = presets.tick(now) {
                app_state.material = material;
                app_state.preset = presets.state().clone();
                app_state.preset_name = presets.current_preset_name().to_string();
            }
            app_state.use_audio = modulator.is_using_audio_data();
            app_state.audio_available = audio_available;
            app_state.update_status();

            self.terminal.draw(|f| ui::render_ui(f, &app_state))?;

            let mut should_exit = false;

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    should_exit = true;
                }
                _ = tokio::time::sleep(Duration::from_millis(1)) => {}
            }

            while !should_exit && crossterm::event::poll(Duration::from_millis(0))? {
                if let Event::Key(key_event) = crossterm::event::read()? {
                    should_exit = handle_key(key_event, &mut modulator, &mut presets);
                    if key_event.code == KeyCode::Char('r') {
                        app_state.levels = modulator.levels();
                        app_state.particle = modulator.params();
                    }
                }
            }

            if should_exit {
                break;
            }

            interval.tick().await;
        }

        info!("modulation stopped");
        drop(stream);
        Ok(())
    }

    /// Clean up terminal state
    fn cleanup(mut self) -> AppResult<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

/// One applied particle tick of a headless run
#[derive(Debug, Clone)]
pub struct SimulationFrame {
    pub time: Duration,
    pub levels: ActivityLevels,
    pub particle: ParticleParams,
    pub material: Option<MaterialParams>,
}

/// Drive both consumers for `config.ticks` particle intervals without a terminal
pub fn run_simulation(config: &SimulationConfig) -> AppResult<Vec<SimulationFrame>> {
    let pipeline = &config.pipeline;
    let mut modulator = ParticleModulator::new(pipeline.modulator.clone());
    modulator.set_use_audio_data(pipeline.use_audio);
    let mut presets = preset_controller(pipeline, LogReplicator);
    let mut analyzer = SpectrumAnalyzer::new();

    let step = pipeline.modulator.update_interval;
    let sample_rate = PREFERRED_SAMPLE_RATE as f32;
    let samples_per_tick = (step.as_secs_f32() * sample_rate) as usize;
    let mut window = vec![0.0; FFT_SIZE];
    let mut frames = Vec::with_capacity(config.ticks);

    for tick in 0..config.ticks {
        let Some(now) = u32::try_from(tick).ok().and_then(|t| step.checked_mul(t)) else {
            warn!(tick, "simulation clock overflowed, stopping early");
            break;
        };

        let spectrum = match config.tone_hz {
            Some(hz) => {
                let offset = tick.saturating_mul(samples_per_tick);
                for (n, sample) in window.iter_mut().enumerate() {
                    let t = offset.wrapping_add(n) as f32 / sample_rate;
                    *sample = config.amplitude * (TAU * hz * t).sin();
                }
                Some(analyzer.analyze(&window))
            }
            None => None,
        };

        let Some(particle) = modulator.tick(now, spectrum)? else {
            continue;
        };

        frames.push(SimulationFrame {
            time: now,
            levels: modulator.levels(),
            particle,
            material: presets.tick(now),
        });
    }

    info!(frames = frames.len(), "simulation finished");
    Ok(frames)
}

/// Each preset of `table` with the material output it produces
pub fn preset_report(table: &PresetTable) -> Vec<(String, MaterialParams)> {
    table
        .iter()
        .enumerate()
        .map(|(i, preset)| {
            (
                preset.name.clone(),
                PresetState::from_preset(i, preset).material_params(),
            )
        })
        .collect()
}
