//! Hologram - ambient soundscape for a spinning wireframe

use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::execute;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hologram::config::{self, HologramConfig};
use hologram::control::{SpeedControl, SpeedSchedule};
use hologram::engine::{default_device_name, list_output_devices, Engine, Player, Recorder};
use hologram::synth::{ReverbUnit, SynthState};

mod cli;

use cli::{Cli, Commands};

/// How often the control loops wake up
const TICK: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            speed,
            headless,
        } => {
            let cfg = config::load_or_default(config_path.as_deref())?;
            play(cfg, speed, headless)?;
        }

        Commands::Record {
            config: config_path,
            output,
            speeds,
            hold,
        } => {
            let cfg = config::load_or_default(config_path.as_deref())?;
            let output = output
                .or_else(|| cfg.audio.output_file.as_ref().map(PathBuf::from))
                .context("no output file: pass --output or set audio.output_file")?;
            let schedule = SpeedSchedule::new(speeds, hold)?;
            record(cfg, &schedule, &output)?;
        }

        Commands::Impulse {
            config: config_path,
            output,
        } => {
            let cfg = config::load_or_default(config_path.as_deref())?;
            write_impulse(&cfg, &output)?;
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            if let Some(name) = default_device_name() {
                println!("Default output: {}\n", name);
            }

            println!("Output devices:");
            let devices = list_output_devices();
            if devices.is_empty() {
                println!("  (none)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!(
                        "  Reverb: {:.1} s ({} frame partitions)",
                        cfg.reverb.seconds, cfg.reverb.partition_size
                    );
                    println!(
                        "  Ramps: intensity {:.2} s, fade-out {:.2} s to {}",
                        cfg.timing.intensity_ramp_secs,
                        cfg.timing.fade_out_secs,
                        cfg.timing.silence_floor
                    );
                    println!("  Speed: step {}, max {}", cfg.speed.step, cfg.speed.max);
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../hologram.example.yaml");

            let path = "hologram.yaml";
            if Path::new(path).exists() {
                println!("hologram.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created hologram.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

fn lock(engine: &Mutex<Engine>) -> Result<MutexGuard<'_, Engine>> {
    engine.lock().map_err(|_| anyhow!("engine lock poisoned"))
}

/// Advances the engine clock from wall time when no device is pulling audio
struct SilentClock {
    enabled: bool,
    last: Instant,
}

impl SilentClock {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: Instant::now(),
        }
    }

    fn tick(&mut self, engine: &Mutex<Engine>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let elapsed = self.last.elapsed().as_secs_f64();
        self.last = Instant::now();
        lock(engine)?.render_seconds(elapsed);
        Ok(())
    }
}

fn play(cfg: HologramConfig, speed: f64, headless: bool) -> Result<()> {
    let engine = Arc::new(Mutex::new(Engine::new(cfg.clone())?));

    let mut player = Player::new();
    let silent = match player.start(engine.clone(), cfg.audio.device.as_deref()) {
        Ok(()) => false,
        Err(err) => {
            warn!("audio output unavailable, continuing silently: {:#}", err);
            true
        }
    };
    let mut clock = SilentClock::new(silent);

    let mut control = SpeedControl::from_config(&cfg.speed);
    let applied = control.set(speed)?;
    if applied != speed {
        warn!(requested = speed, applied, "speed clamped to the reachable range");
    }
    {
        let mut eng = lock(&engine)?;
        eng.start()?;
        eng.set_intensity(control.multiplier())?;
    }

    if headless {
        run_headless(&engine, &mut clock)?;
    } else {
        run_interactive(&engine, &mut control, &mut clock)?;
    }

    lock(&engine)?.stop()?;
    let deadline = Instant::now() + Duration::from_secs_f64(cfg.timing.fade_out_secs) + TICK * 4;
    while lock(&engine)?.state() != SynthState::Idle && Instant::now() < deadline {
        std::thread::sleep(TICK);
        clock.tick(&engine)?;
    }

    player.stop();
    info!("goodbye");
    Ok(())
}

fn run_headless(engine: &Mutex<Engine>, clock: &mut SilentClock) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    println!("Playing. Press Ctrl-C to fade out and exit.");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(TICK);
        clock.tick(engine)?;
    }
    Ok(())
}

fn run_interactive(
    engine: &Mutex<Engine>,
    control: &mut SpeedControl,
    clock: &mut SilentClock,
) -> Result<()> {
    println!("+/- speed, space toggles sound, q quits");
    terminal::enable_raw_mode()?;
    let result = interactive_loop(engine, control, clock);
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn interactive_loop(
    engine: &Mutex<Engine>,
    control: &mut SpeedControl,
    clock: &mut SilentClock,
) -> Result<()> {
    loop {
        let state = lock(engine)?.state();
        execute!(
            stdout(),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!("speed {}x  sound {:?}", control.label(), state))
        )?;
        stdout().flush()?;

        clock.tick(engine)?;
        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let mut eng = lock(engine)?;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => {
                eng.set_intensity(control.increase())?;
            }
            KeyCode::Char('-') | KeyCode::Down => {
                eng.set_intensity(control.decrease())?;
            }
            KeyCode::Char(' ') => match eng.toggle() {
                Ok(SynthState::Running) => {
                    control.reset();
                    eng.set_intensity(control.multiplier())?;
                }
                Ok(_) => {}
                Err(err) => warn!(%err, "toggle failed"),
            },
            _ => {}
        }
    }
}

fn record(cfg: HologramConfig, schedule: &SpeedSchedule, output: &Path) -> Result<()> {
    let sample_rate = cfg.audio.sample_rate;
    println!(
        "Recording {:.1} seconds ({} speeds) to {:?}...",
        schedule.duration_secs(),
        schedule.speeds().len(),
        output
    );

    let mut engine = Engine::new(cfg.clone())?;
    let mut recorder = Recorder::new(output, sample_rate)?;

    engine.start()?;
    let total = (schedule.duration_secs() * sample_rate as f64).round() as u64;
    let mut current = None;

    for i in 0..total {
        let t = i as f64 / sample_rate as f64;
        let speed = schedule.speed_at(t);
        if current != Some(speed) {
            engine.set_intensity(speed)?;
            current = Some(speed);
        }
        recorder.write_frame(engine.process())?;

        // Progress update every second
        if i % sample_rate as u64 == 0 {
            print!(
                "\r  Progress: {}s / {:.0}s (speed {:.1}x)",
                i / sample_rate as u64,
                schedule.duration_secs(),
                speed
            );
            stdout().flush()?;
        }
    }

    // Fade out, then let the reverb tail ring
    engine.stop()?;
    let tail = cfg.timing.fade_out_secs + cfg.reverb.seconds;
    recorder.write_frames(&engine.render_seconds(tail))?;

    let seconds = recorder.duration_secs();
    recorder.finalize()?;
    println!("\nRecorded {:.1}s to {:?}", seconds, output);
    Ok(())
}

fn write_impulse(cfg: &HologramConfig, output: &Path) -> Result<()> {
    let sample_rate = cfg.audio.sample_rate;
    let mut rng = match cfg.reverb.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };
    let reverb = ReverbUnit::generate(sample_rate as f64, cfg.reverb.seconds, &mut rng)?;
    let impulse = reverb.impulse();

    let mut recorder = Recorder::new(output, sample_rate)?;
    for (&left, &right) in impulse.channel(0).iter().zip(impulse.channel(1)) {
        recorder.write_frame([left, right])?;
    }
    recorder.finalize()?;

    println!(
        "Wrote {:.1}s impulse ({} frames) to {:?}",
        impulse.duration_secs(),
        impulse.len(),
        output
    );
    Ok(())
}
