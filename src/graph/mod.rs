//! Audio processing graph
//!
//! The synthesizer talks to its host through the [`AudioGraph`] trait:
//! oscillator, gain and convolution nodes, node-to-node and node-to-parameter
//! connections, parameter automation, and a monotonic audio clock.
//! [`RenderGraph`] is the in-process implementation that renders frames.

mod convolver;
mod oscillator;
mod param;
mod render;

pub use convolver::{Convolver, ImpulseResponse};
pub use oscillator::{Oscillator, Waveform};
pub use param::AudioParam;
pub use render::RenderGraph;

use std::fmt;

use thiserror::Error;

/// One stereo sample frame
pub type Frame = [f64; 2];

/// Handle to a node in a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The gain parameter of this node
    pub fn gain(self) -> ParamRef {
        ParamRef {
            node: self,
            param: Param::Gain,
        }
    }

    /// The frequency parameter of this node
    pub fn frequency(self) -> ParamRef {
        ParamRef {
            node: self,
            param: Param::Frequency,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Automatable node parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Oscillator frequency in Hz
    Frequency,
    /// Gain node multiplier
    Gain,
}

/// A specific parameter on a specific node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamRef {
    pub node: NodeId,
    pub param: Param,
}

/// Where a connection lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The signal input of a node
    Node(NodeId),
    /// Summed onto a parameter's automation value
    Param(ParamRef),
}

impl Target {
    /// The node the connection lands on
    pub fn node(&self) -> NodeId {
        match *self {
            Target::Node(node) => node,
            Target::Param(param) => param.node,
        }
    }
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

impl From<ParamRef> for Target {
    fn from(param: ParamRef) -> Self {
        Target::Param(param)
    }
}

/// Errors raised by graph operations
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {node} has no {param:?} parameter")]
    InvalidParam { node: NodeId, param: Param },

    #[error("node {0} does not accept signal input")]
    NoInput(NodeId),

    #[error("connecting {from} to {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    #[error("exponential ramp target must be positive and finite, got {0}")]
    InvalidRampTarget(f64),

    #[error("invalid schedule time {0}")]
    InvalidTime(f64),

    #[error("invalid impulse response: {0}")]
    InvalidImpulse(String),
}

/// Capability interface for building and automating an audio graph.
///
/// Times are seconds on the graph's own clock (see [`AudioGraph::now`]).
pub trait AudioGraph {
    /// Sample rate in Hz
    fn sample_rate(&self) -> f64;

    /// Current time on the audio clock in seconds
    fn now(&self) -> f64;

    /// The sink node; whatever reaches it is audible
    fn destination(&self) -> NodeId;

    /// Create an oscillator. It produces silence until started.
    fn create_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f64,
    ) -> Result<NodeId, GraphError>;

    /// Create a gain node
    fn create_gain(&mut self, gain: f64) -> Result<NodeId, GraphError>;

    /// Create a convolution node holding `impulse` as its kernel
    fn create_convolver(&mut self, impulse: &ImpulseResponse) -> Result<NodeId, GraphError>;

    /// Route the output of `from` into a node input or a parameter
    fn connect(&mut self, from: NodeId, to: Target) -> Result<(), GraphError>;

    /// Remove every connection leaving `node`
    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Start an oscillator at `at`
    fn start(&mut self, node: NodeId, at: f64) -> Result<(), GraphError>;

    /// Stop an oscillator at `at`; it cannot be restarted
    fn stop(&mut self, node: NodeId, at: f64) -> Result<(), GraphError>;

    /// Jump a parameter to `value` at `at`
    fn set_value_at_time(
        &mut self,
        param: ParamRef,
        value: f64,
        at: f64,
    ) -> Result<(), GraphError>;

    /// Ramp a parameter exponentially from its live value at `from` to
    /// `target` at `until`, superseding anything scheduled from `from` on.
    fn exponential_ramp(
        &mut self,
        param: ParamRef,
        target: f64,
        from: f64,
        until: f64,
    ) -> Result<(), GraphError>;

    /// Automation value of a parameter at the current time
    fn param_value(&self, param: ParamRef) -> Result<f64, GraphError>;

    /// Disconnect and free a node; a later node may reuse its id
    fn release(&mut self, node: NodeId) -> Result<(), GraphError>;
}
