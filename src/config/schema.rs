//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::synth::SynthSettings;

/// Main configuration for Hologram
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HologramConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Output level
    #[serde(default)]
    pub master: MasterConfig,

    /// Reverb impulse settings
    #[serde(default)]
    pub reverb: ReverbConfig,

    /// Ramp and fade timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Speed control stepping
    #[serde(default)]
    pub speed: SpeedConfig,
}

impl HologramConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        if !(0.0..=1.0).contains(&self.master.volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }

        if !(self.reverb.seconds > 0.0 && self.reverb.seconds <= 30.0) {
            bail!("Reverb length must be greater than 0 and at most 30 seconds");
        }
        if self.audio.sample_rate as f64 * self.reverb.seconds < 1.0 {
            bail!("Reverb length must cover at least one sample");
        }
        if self.reverb.partition_size < 16 || self.reverb.partition_size > 8192 {
            bail!("Reverb partition size must be between 16 and 8192");
        }

        if !(self.timing.intensity_ramp_secs > 0.0) {
            bail!("Intensity ramp must be longer than 0 seconds");
        }
        if !(self.timing.fade_out_secs > 0.0) {
            bail!("Fade-out must be longer than 0 seconds");
        }
        if !(self.timing.silence_floor > 0.0 && self.timing.silence_floor < 0.1) {
            bail!("Silence floor must be above 0 and below 0.1");
        }

        if !(self.speed.step > 0.0) {
            bail!("Speed step must be positive");
        }
        if self.speed.max < 1.0 {
            bail!("Maximum speed must be at least 1.0");
        }

        Ok(())
    }

    /// Synthesizer settings derived from this configuration
    pub fn synth_settings(&self) -> SynthSettings {
        SynthSettings {
            master_volume: self.master.volume as f64,
            reverb_seconds: self.reverb.seconds,
            reverb_seed: self.reverb.seed,
            intensity_ramp_secs: self.timing.intensity_ramp_secs,
            fade_out_secs: self.timing.fade_out_secs,
            silence_floor: self.timing.silence_floor,
        }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in frames (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,

    /// Output file path (for recording)
    #[serde(default)]
    pub output_file: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
            output_file: None,
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> usize { 512 }

/// Master settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Shared output gain 0.0-1.0 (default: 0.5)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self { volume: default_volume() }
    }
}

fn default_volume() -> f32 { 0.5 }

/// Reverb settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverbConfig {
    /// Impulse length in seconds (default: 5)
    #[serde(default = "default_reverb_seconds")]
    pub seconds: f64,

    /// Noise seed; random when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Convolution block size in frames (default: 256)
    #[serde(default = "default_partition_size")]
    pub partition_size: usize,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            seconds: default_reverb_seconds(),
            seed: None,
            partition_size: default_partition_size(),
        }
    }
}

fn default_reverb_seconds() -> f64 { 5.0 }
fn default_partition_size() -> usize { 256 }

/// Ramp timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Intensity ramp duration (default: 0.5 s)
    #[serde(default = "default_intensity_ramp")]
    pub intensity_ramp_secs: f64,

    /// Stop fade duration (default: 1.0 s)
    #[serde(default = "default_fade_out")]
    pub fade_out_secs: f64,

    /// Level the stop fade ramps towards (default: 0.001)
    #[serde(default = "default_silence_floor")]
    pub silence_floor: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            intensity_ramp_secs: default_intensity_ramp(),
            fade_out_secs: default_fade_out(),
            silence_floor: default_silence_floor(),
        }
    }
}

fn default_intensity_ramp() -> f64 { 0.5 }
fn default_fade_out() -> f64 { 1.0 }
fn default_silence_floor() -> f64 { 0.001 }

/// Speed control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedConfig {
    /// Multiplier change per key press (default: 1.0)
    #[serde(default = "default_speed_step")]
    pub step: f64,

    /// Highest reachable multiplier (default: 20)
    #[serde(default = "default_speed_max")]
    pub max: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            step: default_speed_step(),
            max: default_speed_max(),
        }
    }
}

fn default_speed_step() -> f64 { 1.0 }
fn default_speed_max() -> f64 { 20.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512); // default
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: HologramConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, HologramConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_match_reference_synth() {
        let settings = HologramConfig::default().synth_settings();
        assert_eq!(settings, SynthSettings::default());
    }

    #[test]
    fn test_reverb_config() {
        let yaml = r#"
seconds: 2.5
seed: 99
"#;
        let config: ReverbConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.seconds, 2.5);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.partition_size, 256);
    }

    #[test]
    fn test_rejects_zero_silence_floor() {
        let mut config = HologramConfig::default();
        config.timing.silence_floor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_reverb_shorter_than_one_sample() {
        let mut config = HologramConfig::default();
        config.audio.sample_rate = 8000;
        config.reverb.seconds = 1e-5;
        assert!(config.validate().is_err());

        config.reverb.seconds = 0.001;
        assert!(config.validate().is_ok());
        assert!(crate::engine::Engine::new(config).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = HologramConfig::default();
        config.master.volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = HologramConfig::default();
        config.reverb.seconds = 0.0;
        assert!(config.validate().is_err());

        let mut config = HologramConfig::default();
        config.audio.sample_rate = 4000;
        assert!(config.validate().is_err());

        let mut config = HologramConfig::default();
        config.speed.step = -1.0;
        assert!(config.validate().is_err());

        let mut config = HologramConfig::default();
        config.timing.fade_out_secs = f64::NAN;
        assert!(config.validate().is_err());
    }
}
