use almod::app::{self, ExitCode};
use almod::config::{Args, Commands, Config, SimulationConfig};
use almod::preset::PresetTable;
use almod::{audio, logging};
use clap::Parser;
use dialoguer::{Select, theme::ColorfulTheme};

fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let device_list = audio::list_input_devices()?;

    if device_list.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    // Interactive selection
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select an audio input device")
        .items(&device_list)
        .default(0)
        .interact()?;

    println!("{}", device_list[selection]);

    Ok(())
}

fn print_presets() {
    println!(
        "{:<8} {:>7} {:>9} {:>9} {:>5} {:>5}",
        "Preset", "Gain", "Smooth", "Emission", "Safe", "Beat"
    );
    for (name, params) in app::preset_report(&PresetTable::default()) {
        println!(
            "{:<8} {:>7.2} {:>9.2} {:>9.2} {:>5} {:>5}",
            name,
            params.al_gain,
            params.al_smoothing,
            params.emission_gain,
            params.safe_mode,
            params.beat_pulse
        );
    }
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, e);
    std::process::exit(ExitCode::Error as i32);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => {
            let config = match Config::from_run_args(run_args) {
                Ok(c) => c,
                Err(e) => fail("Configuration error", e),
            };

            // The TUI owns the terminal, so logs only go to a file
            if let Err(e) = logging::init(config.log_file.as_deref(), false, config.debug) {
                fail("Setup error", e);
            }

            match app::App::new_with_config(config) {
                Ok(app) => {
                    let run_result = app.run().await;
                    match run_result.result {
                        Ok(_) => std::process::exit(run_result.exit_code as i32),
                        Err(e) => fail("Application error", e),
                    }
                }
                Err(e) => fail("Setup error", e),
            }
        }
        Commands::List(_) => {
            if let Err(e) = list_devices() {
                fail("Error listing devices", e);
            }
        }
        Commands::Presets(_) => print_presets(),
        Commands::Simulate(simulate_args) => {
            let config = match SimulationConfig::from_simulate_args(&simulate_args) {
                Ok(c) => c,
                Err(e) => fail("Configuration error", e),
            };
            if let Err(e) = logging::init(None, true, config.pipeline.debug) {
                fail("Setup error", e);
            }

            let frames = match app::run_simulation(&config) {
                Ok(frames) => frames,
                Err(e) => fail("Error during simulation", e),
            };

            if !simulate_args.quiet {
                println!("time_ms emission speed size emission_rate start_speed start_size");
            }
            for frame in &frames {
                println!(
                    "{} {:.3} {:.3} {:.3} {:.2} {:.2} {:.2}",
                    frame.time.as_millis(),
                    frame.levels.emission,
                    frame.levels.speed,
                    frame.levels.size,
                    frame.particle.emission_rate,
                    frame.particle.start_speed,
                    frame.particle.start_size
                );
            }
        }
    }
}
