//! Voice definitions
//!
//! A voice is one oscillator, an LFO whose output is scaled by a depth gain
//! and summed onto the voice gain, and the voice gain itself.

use crate::graph::{AudioGraph, GraphError, NodeId, Waveform};

/// Semantic layer a voice belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Ocean-like sub-bass; quieter and higher as speed rises
    Low,
    /// Atmospheric upper layer; louder and higher as speed rises
    High,
}

/// Static parameters of one voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSpec {
    pub layer: Layer,
    /// Position within its layer (0-based)
    pub index: usize,
    pub waveform: Waveform,
    pub base_frequency: f64,
    pub base_gain: f64,
    pub lfo_frequency: f64,
    pub lfo_depth: f64,
}

const LOW_FREQUENCIES: [f64; 5] = [25.0, 30.87, 35.0, 40.0, 45.0];
const HIGH_FREQUENCIES: [f64; 5] = [55.0, 65.41, 73.42, 82.41, 87.31];

/// The reference bank: five low voices followed by five high voices
pub fn reference_bank() -> Vec<VoiceSpec> {
    let low = LOW_FREQUENCIES.iter().enumerate().map(|(i, &freq)| VoiceSpec {
        layer: Layer::Low,
        index: i,
        waveform: if i % 2 == 0 {
            Waveform::Sine
        } else {
            Waveform::Triangle
        },
        base_frequency: freq,
        base_gain: 0.15,
        lfo_frequency: 0.2 + i as f64 * 0.1,
        lfo_depth: 0.3,
    });

    let high = HIGH_FREQUENCIES.iter().enumerate().map(|(j, &freq)| VoiceSpec {
        layer: Layer::High,
        index: j,
        waveform: Waveform::Sine,
        base_frequency: freq,
        base_gain: 0.05,
        lfo_frequency: 0.05 + j as f64 * 0.03,
        lfo_depth: 0.1,
    });

    low.chain(high).collect()
}

/// A live voice: its spec plus the graph nodes realizing it
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    spec: VoiceSpec,
    oscillator: NodeId,
    lfo: NodeId,
    lfo_depth: NodeId,
    output: NodeId,
}

impl Voice {
    /// Build the voice's nodes in `graph`, route its output into `sink`
    /// and start both oscillators at the current time.
    pub fn build<G: AudioGraph>(
        graph: &mut G,
        spec: VoiceSpec,
        sink: NodeId,
    ) -> Result<Self, GraphError> {
        let now = graph.now();

        let oscillator = graph.create_oscillator(spec.waveform, spec.base_frequency)?;
        let lfo = graph.create_oscillator(Waveform::Sine, spec.lfo_frequency)?;
        let lfo_depth = graph.create_gain(spec.lfo_depth)?;
        let output = graph.create_gain(spec.base_gain)?;

        graph.set_value_at_time(oscillator.frequency(), spec.base_frequency, now)?;
        graph.set_value_at_time(lfo.frequency(), spec.lfo_frequency, now)?;
        graph.set_value_at_time(lfo_depth.gain(), spec.lfo_depth, now)?;
        graph.set_value_at_time(output.gain(), spec.base_gain, now)?;

        graph.connect(lfo, lfo_depth.into())?;
        graph.connect(lfo_depth, output.gain().into())?;
        graph.connect(oscillator, output.into())?;
        graph.connect(output, sink.into())?;

        graph.start(oscillator, now)?;
        graph.start(lfo, now)?;

        Ok(Self {
            spec,
            oscillator,
            lfo,
            lfo_depth,
            output,
        })
    }

    pub fn spec(&self) -> &VoiceSpec {
        &self.spec
    }

    pub fn layer(&self) -> Layer {
        self.spec.layer
    }

    pub fn index(&self) -> usize {
        self.spec.index
    }

    /// The audible oscillator
    pub fn oscillator(&self) -> NodeId {
        self.oscillator
    }

    /// The voice output gain (LFO-modulated)
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Schedule both oscillators to halt at `at`
    pub fn halt_at<G: AudioGraph>(&self, graph: &mut G, at: f64) -> Result<(), GraphError> {
        graph.stop(self.oscillator, at)?;
        graph.stop(self.lfo, at)
    }

    /// Disconnect and free every node of the voice
    pub fn destroy<G: AudioGraph>(self, graph: &mut G) -> Result<(), GraphError> {
        for node in [self.oscillator, self.lfo, self.lfo_depth, self.output] {
            graph.disconnect(node)?;
            graph.release(node)?;
        }
        Ok(())
    }
}
