//! Hologram - ambient soundscape for a spinning wireframe
//!
//! Ten oscillator voices in two layers, shaped by slow LFOs and a long
//! convolution reverb, follow a single speed multiplier: the low layer
//! thins out and climbs while the high layer swells.

pub mod config;
pub mod control;
pub mod engine;
pub mod graph;
pub mod synth;

pub use config::HologramConfig;
pub use engine::Engine;
pub use synth::{AmbientSynthesizer, SynthError, SynthState};
