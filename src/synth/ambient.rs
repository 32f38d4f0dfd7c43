//! The ambient synthesizer
//!
//! Owns a shared output gain, one convolution reverb, and a bank of voices
//! that all route through the reverb. Lifecycle:
//!
//! ```text
//! Idle --start()--> Running --stop()--> Stopping --(fade window)--> Idle
//! ```
//!
//! Teardown after the fade is deferred: it completes on the first
//! [`AmbientSynthesizer::poll`] (or any public operation) at or after the
//! deadline on the audio clock.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::{debug, info, warn};

use super::voice::{reference_bank, Voice, VoiceSpec};
use super::{Intensity, IntensityCurve, ReverbUnit, SynthError, SynthSettings, VoiceTarget};
use crate::graph::{AudioGraph, GraphError, NodeId};

/// Lifecycle state of the synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthState {
    Idle,
    Running,
    Stopping,
}

/// Multi-voice ambient synthesizer driven by one intensity multiplier
pub struct AmbientSynthesizer<G: AudioGraph> {
    graph: G,
    settings: SynthSettings,
    master: NodeId,
    reverb: NodeId,
    bank: Vec<VoiceSpec>,
    voices: Vec<Voice>,
    state: SynthState,
    intensity: Intensity,
    teardown_at: f64,
}

impl<G: AudioGraph> AmbientSynthesizer<G> {
    /// Build the output stage and reverb on `graph`.
    ///
    /// The reverb noise comes from `settings.reverb_seed` when set, otherwise
    /// from a randomly seeded generator.
    pub fn new(graph: G, settings: SynthSettings) -> Result<Self, SynthError> {
        let mut rng = match settings.reverb_seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        Self::with_rng(graph, settings, &mut rng)
    }

    /// Like [`AmbientSynthesizer::new`] with an explicit noise generator
    pub fn with_rng<R: Rng>(
        mut graph: G,
        settings: SynthSettings,
        rng: &mut R,
    ) -> Result<Self, SynthError> {
        let reverb_unit = ReverbUnit::generate(graph.sample_rate(), settings.reverb_seconds, rng)
            .map_err(SynthError::AudioGraphUnavailable)?;
        let (master, reverb) = Self::build_output(&mut graph, &settings, &reverb_unit)
            .map_err(SynthError::AudioGraphUnavailable)?;

        info!(
            sample_rate = graph.sample_rate(),
            reverb_secs = reverb_unit.impulse().duration_secs(),
            "synthesizer ready"
        );

        Ok(Self {
            graph,
            settings,
            master,
            reverb,
            bank: reference_bank(),
            voices: Vec::new(),
            state: SynthState::Idle,
            intensity: Intensity::UNIT,
            teardown_at: 0.0,
        })
    }

    fn build_output(
        graph: &mut G,
        settings: &SynthSettings,
        reverb_unit: &ReverbUnit,
    ) -> Result<(NodeId, NodeId), GraphError> {
        let master = graph.create_gain(settings.master_volume)?;
        let reverb = graph.create_convolver(reverb_unit.impulse())?;
        graph.connect(reverb, master.into())?;
        let destination = graph.destination();
        graph.connect(master, destination.into())?;
        Ok((master, reverb))
    }

    /// Build the voice bank and start every oscillator.
    ///
    /// A no-op while running; rejected with [`SynthError::Stopping`] until a
    /// previous fade-out has been torn down.
    pub fn start(&mut self) -> Result<(), SynthError> {
        self.poll()?;
        match self.state {
            SynthState::Running => {
                debug!("start ignored, already running");
                return Ok(());
            }
            SynthState::Stopping => return Err(SynthError::Stopping),
            SynthState::Idle => {}
        }

        let mut voices = Vec::with_capacity(self.bank.len());
        for spec in &self.bank {
            match Voice::build(&mut self.graph, *spec, self.reverb) {
                Ok(voice) => voices.push(voice),
                Err(err) => {
                    for voice in voices {
                        if let Err(cleanup) = voice.destroy(&mut self.graph) {
                            warn!(%cleanup, "failed to release partially built voice");
                        }
                    }
                    return Err(err.into());
                }
            }
        }

        self.voices = voices;
        self.intensity = Intensity::UNIT;
        self.state = SynthState::Running;
        info!(voices = self.voices.len(), at = self.graph.now(), "synthesizer started");
        Ok(())
    }

    /// Retarget every voice for `multiplier`.
    ///
    /// Each frequency and gain ramps exponentially from its live value to the
    /// new target over the intensity ramp window, superseding any ramp still
    /// in flight. Invalid multipliers are rejected before touching the graph;
    /// outside of the running state this is a no-op.
    pub fn set_intensity(&mut self, multiplier: f64) -> Result<(), SynthError> {
        let intensity = Intensity::new(multiplier)?;
        self.poll()?;
        if self.state != SynthState::Running {
            debug!(multiplier, state = ?self.state, "set_intensity ignored");
            return Ok(());
        }

        // Extreme multipliers can overflow a target; check all before ramping any.
        let targets: Vec<VoiceTarget> = self
            .voices
            .iter()
            .map(|voice| IntensityCurve::for_layer(voice.layer()).target(voice.index(), intensity))
            .collect();
        if !targets.iter().all(VoiceTarget::is_rampable) {
            return Err(SynthError::InvalidIntensity(multiplier));
        }

        let now = self.graph.now();
        let until = now + self.settings.intensity_ramp_secs;
        for (voice, target) in self.voices.iter().zip(&targets) {
            self.graph
                .exponential_ramp(voice.oscillator().frequency(), target.frequency, now, until)?;
            self.graph
                .exponential_ramp(voice.output().gain(), target.gain, now, until)?;
        }

        self.intensity = intensity;
        debug!(multiplier, at = now, "intensity retargeted");
        Ok(())
    }

    /// Fade every voice to the silence floor and schedule teardown.
    ///
    /// A no-op unless running.
    pub fn stop(&mut self) -> Result<(), SynthError> {
        self.poll()?;
        if self.state != SynthState::Running {
            debug!(state = ?self.state, "stop ignored");
            return Ok(());
        }

        let now = self.graph.now();
        let until = now + self.settings.fade_out_secs;
        for voice in &self.voices {
            self.graph
                .exponential_ramp(voice.output().gain(), self.settings.silence_floor, now, until)?;
            voice.halt_at(&mut self.graph, until)?;
        }

        self.state = SynthState::Stopping;
        self.teardown_at = until;
        info!(at = now, teardown_at = until, "synthesizer fading out");
        Ok(())
    }

    /// Complete a pending teardown once the fade window has elapsed
    pub fn poll(&mut self) -> Result<(), SynthError> {
        if self.state == SynthState::Stopping && self.graph.now() >= self.teardown_at {
            self.teardown()?;
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), SynthError> {
        let count = self.voices.len();
        for voice in self.voices.drain(..) {
            voice.destroy(&mut self.graph)?;
        }
        self.state = SynthState::Idle;
        info!(voices = count, at = self.graph.now(), "synthesizer stopped");
        Ok(())
    }

    pub fn state(&self) -> SynthState {
        self.state
    }

    /// The last accepted multiplier (1.0 after `start`)
    pub fn intensity(&self) -> f64 {
        self.intensity.value()
    }

    /// Live voices; empty unless running or stopping
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Parameters every `start` builds voices from
    pub fn bank(&self) -> &[VoiceSpec] {
        &self.bank
    }

    /// Audio-clock time at which a pending teardown completes
    pub fn teardown_deadline(&self) -> Option<f64> {
        (self.state == SynthState::Stopping).then_some(self.teardown_at)
    }

    pub fn settings(&self) -> &SynthSettings {
        &self.settings
    }

    /// Shared output gain node
    pub fn master(&self) -> NodeId {
        self.master
    }

    /// Shared reverb node
    pub fn reverb(&self) -> NodeId {
        self.reverb
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }
}
