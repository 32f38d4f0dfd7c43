//! CLI interface for Hologram

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ambient hologram soundscape
#[derive(Parser)]
#[command(name = "hologram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play the soundscape in real time (+/- change speed, space toggles sound, q quits)
    Play {
        /// Configuration file path (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Initial speed multiplier
        #[arg(short, long, default_value = "1.0")]
        speed: f64,

        /// Run without keyboard control until Ctrl-C
        #[arg(long)]
        headless: bool,
    },

    /// Render to a WAV file, following a speed schedule
    Record {
        /// Configuration file path (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path (falls back to `audio.output_file`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated speed multipliers, played in order
        #[arg(short, long, value_delimiter = ',', default_value = "1.0")]
        speeds: Vec<f64>,

        /// Seconds each speed is held
        #[arg(long, default_value = "10")]
        hold: f64,
    },

    /// Write the reverb impulse response to a WAV file
    Impulse {
        /// Configuration file path (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List available audio output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "hologram.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
