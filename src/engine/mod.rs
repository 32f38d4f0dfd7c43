//! Audio engine for Hologram
//!
//! Owns the synthesizer and its in-process render graph, and hands out
//! frames to real-time playback or the WAV recorder.

mod player;
mod recorder;

pub use player::{default_device_name, list_output_devices, Player};
pub use recorder::Recorder;

use tracing::warn;

use crate::config::HologramConfig;
use crate::graph::{AudioGraph, Frame, RenderGraph};
use crate::synth::{AmbientSynthesizer, SynthError, SynthState};

/// The main audio engine
pub struct Engine {
    config: HologramConfig,
    synth: AmbientSynthesizer<RenderGraph>,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(config: HologramConfig) -> Result<Self, SynthError> {
        let graph = RenderGraph::new(
            config.audio.sample_rate as f64,
            config.reverb.partition_size,
        );
        let synth = AmbientSynthesizer::new(graph, config.synth_settings())?;
        Ok(Self { config, synth })
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f64 {
        self.config.audio.sample_rate as f64
    }

    pub fn config(&self) -> &HologramConfig {
        &self.config
    }

    /// Current time on the audio clock
    pub fn now(&self) -> f64 {
        self.synth.graph().now()
    }

    pub fn synth(&self) -> &AmbientSynthesizer<RenderGraph> {
        &self.synth
    }

    pub fn state(&self) -> SynthState {
        self.synth.state()
    }

    /// Start the voices
    pub fn start(&mut self) -> Result<(), SynthError> {
        self.synth.start()
    }

    /// Fade out and schedule teardown
    pub fn stop(&mut self) -> Result<(), SynthError> {
        self.synth.stop()
    }

    /// Follow a new speed multiplier
    pub fn set_intensity(&mut self, multiplier: f64) -> Result<(), SynthError> {
        self.synth.set_intensity(multiplier)
    }

    /// Start if idle, stop if running; returns the resulting state
    pub fn toggle(&mut self) -> Result<SynthState, SynthError> {
        match self.synth.state() {
            SynthState::Idle => self.synth.start()?,
            SynthState::Running => self.synth.stop()?,
            SynthState::Stopping => {}
        }
        Ok(self.synth.state())
    }

    /// Generate the next stereo frame
    pub fn process(&mut self) -> Frame {
        if let Err(err) = self.synth.poll() {
            warn!(%err, "teardown failed");
        }
        self.synth.graph_mut().render_frame()
    }

    /// Fill an interleaved buffer with `channels` channels.
    ///
    /// Mono gets the mix of both sides; extra channels repeat left/right.
    pub fn fill_buffer(&mut self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in buffer.chunks_mut(channels) {
            let [left, right] = self.process();
            if channels == 1 {
                frame[0] = ((left + right) * 0.5) as f32;
            } else {
                for (ch, sample) in frame.iter_mut().enumerate() {
                    let value = if ch % 2 == 0 { left } else { right };
                    *sample = value as f32;
                }
            }
        }
    }

    /// Render `seconds` of audio into a stereo buffer
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<Frame> {
        let count = (seconds * self.sample_rate()).round() as usize;
        (0..count).map(|_| self.process()).collect()
    }

    /// Whether the engine is producing voices
    pub fn is_running(&self) -> bool {
        self.synth.state() == SynthState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> HologramConfig {
        let mut config = HologramConfig::default();
        config.audio.sample_rate = 8000;
        config.reverb.seconds = 0.1;
        config.reverb.seed = Some(5);
        config.reverb.partition_size = 64;
        config
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new(test_config()).unwrap();

        assert_eq!(engine.sample_rate(), 8000.0);
        assert!(!engine.is_running());
        assert_eq!(engine.state(), SynthState::Idle);
    }

    #[test]
    fn test_idle_engine_is_silent() {
        let mut engine = Engine::new(test_config()).unwrap();
        let frames = engine.render_seconds(0.05);
        assert_eq!(frames.len(), 400);
        assert!(frames.iter().all(|f| *f == [0.0, 0.0]));
    }

    #[test]
    fn test_engine_produces_audio() {
        let mut engine = Engine::new(test_config()).unwrap();
        engine.start().unwrap();
        engine.set_intensity(1.0).unwrap();

        let peak = engine
            .render_seconds(0.25)
            .iter()
            .fold(0.0f64, |a, f| a.max(f[0].abs()).max(f[1].abs()));
        assert!(peak > 0.0, "Expected non-zero audio output");
    }

    #[test]
    fn test_engine_fill_buffer() {
        let mut engine = Engine::new(test_config()).unwrap();
        engine.start().unwrap();

        let mut buffer = vec![0.0f32; 2048];
        engine.fill_buffer(&mut buffer, 2);

        assert!(buffer.iter().any(|&s| s.abs() > 0.0));
    }

    #[test]
    fn test_fill_buffer_mono() {
        let mut engine = Engine::new(test_config()).unwrap();
        engine.start().unwrap();

        let mut buffer = vec![0.0f32; 1024];
        engine.fill_buffer(&mut buffer, 1);

        assert!(engine.now() > 0.127 && engine.now() < 0.129);
    }

    #[test]
    fn test_process_completes_teardown() {
        let mut engine = Engine::new(test_config()).unwrap();
        engine.start().unwrap();
        engine.stop().unwrap();
        assert_eq!(engine.state(), SynthState::Stopping);

        engine.render_seconds(1.01);
        assert_eq!(engine.state(), SynthState::Idle);
        assert!(engine.synth().voices().is_empty());
    }

    #[test]
    fn test_toggle_cycles_states() {
        let mut engine = Engine::new(test_config()).unwrap();

        assert_eq!(engine.toggle().unwrap(), SynthState::Running);
        assert_eq!(engine.toggle().unwrap(), SynthState::Stopping);
        // Toggling during the fade is ignored
        assert_eq!(engine.toggle().unwrap(), SynthState::Stopping);

        engine.render_seconds(1.01);
        assert_eq!(engine.toggle().unwrap(), SynthState::Running);
    }
}
