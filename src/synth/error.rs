//! Synthesizer errors

use thiserror::Error;

use crate::graph::GraphError;

/// Errors returned by the ambient synthesizer
#[derive(Debug, Error)]
pub enum SynthError {
    /// The multiplier was zero, negative, or not finite
    #[error("intensity multiplier must be positive and finite, got {0}")]
    InvalidIntensity(f64),

    /// The audio graph could not be set up; the synthesizer is unusable
    #[error("audio graph unavailable: {0}")]
    AudioGraphUnavailable(#[source] GraphError),

    /// `start` was called while the previous session is still fading out
    #[error("synthesizer is still fading out")]
    Stopping,

    #[error(transparent)]
    Graph(#[from] GraphError),
}
