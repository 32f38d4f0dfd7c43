//! Ambient synthesizer
//!
//! Ten oscillator voices in two layers, each with its own tremolo LFO,
//! routed through one convolution reverb into a shared output gain.

mod ambient;
mod error;
mod mapping;
mod reverb;
mod voice;

pub use ambient::{AmbientSynthesizer, SynthState};
pub use error::SynthError;
pub use mapping::{GainResponse, Intensity, IntensityCurve, VoiceTarget};
pub use reverb::{decay_envelope, ReverbUnit, REVERB_CHANNELS};
pub use voice::{reference_bank, Layer, Voice, VoiceSpec};

/// Tunables for the synthesizer
#[derive(Debug, Clone, PartialEq)]
pub struct SynthSettings {
    /// Level of the shared output gain
    pub master_volume: f64,
    /// Length of the reverb impulse in seconds
    pub reverb_seconds: f64,
    /// Seed for the reverb noise (random when `None`)
    pub reverb_seed: Option<u64>,
    /// Duration of intensity ramps in seconds
    pub intensity_ramp_secs: f64,
    /// Duration of the stop fade in seconds
    pub fade_out_secs: f64,
    /// Gain the stop fade ramps towards; must stay above zero
    pub silence_floor: f64,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.5,
            reverb_seconds: 5.0,
            reverb_seed: None,
            intensity_ramp_secs: 0.5,
            fade_out_secs: 1.0,
            silence_floor: 0.001,
        }
    }
}
