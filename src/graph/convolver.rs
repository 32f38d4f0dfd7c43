//! Partitioned FFT convolution
//!
//! Uniformly-partitioned overlap-save convolution. The impulse response is
//! split into blocks of `partition` samples whose spectra are precomputed;
//! each full input block is transformed once and multiplied against every
//! partition through a frequency-domain delay line. Output lags input by
//! exactly one partition.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::{Frame, GraphError};

/// A multi-channel impulse response
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    sample_rate: f64,
    channels: Vec<Vec<f64>>,
}

impl ImpulseResponse {
    /// Create an impulse response from per-channel sample data.
    ///
    /// Requires one or two channels of equal, non-zero length.
    pub fn new(sample_rate: f64, channels: Vec<Vec<f64>>) -> Result<Self, GraphError> {
        if channels.is_empty() || channels.len() > 2 {
            return Err(GraphError::InvalidImpulse(format!(
                "expected 1 or 2 channels, got {}",
                channels.len()
            )));
        }
        let len = channels[0].len();
        if len == 0 || channels.iter().any(|c| c.len() != len) {
            return Err(GraphError::InvalidImpulse(
                "channels must be non-empty and of equal length".to_string(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Sample rate the response was generated at
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in samples per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always false; construction rejects empty responses
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }
}

/// Streaming stereo convolver with mono input
pub struct Convolver {
    partition: usize,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
    /// Partition spectra per output channel
    kernels: [Vec<Vec<Complex<f64>>>; 2],
    /// Input spectra, most recent at `head`
    history: Vec<Vec<Complex<f64>>>,
    head: usize,
    /// Previous and current input block (2 * partition samples)
    window: Vec<f64>,
    fill: usize,
    /// Output block being played back
    pending: [Vec<f64>; 2],
    scratch: Vec<Complex<f64>>,
    accum: Vec<Complex<f64>>,
}

impl Convolver {
    /// Create a convolver for `impulse` using blocks of `partition` samples.
    ///
    /// A mono impulse feeds both output channels.
    pub fn new(impulse: &ImpulseResponse, partition: usize) -> Result<Self, GraphError> {
        if partition == 0 {
            return Err(GraphError::InvalidImpulse(
                "partition size must be non-zero".to_string(),
            ));
        }
        let size = partition * 2;
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);

        let partitions = impulse.len().div_ceil(partition);
        let build = |samples: &[f64]| -> Vec<Vec<Complex<f64>>> {
            samples
                .chunks(partition)
                .map(|chunk| {
                    let mut spectrum = vec![Complex::new(0.0, 0.0); size];
                    for (bin, &s) in spectrum.iter_mut().zip(chunk) {
                        bin.re = s;
                    }
                    fft.process(&mut spectrum);
                    spectrum
                })
                .collect()
        };

        let left = build(impulse.channel(0));
        let right = if impulse.channel_count() > 1 {
            build(impulse.channel(1))
        } else {
            left.clone()
        };

        Ok(Self {
            partition,
            fft,
            ifft,
            kernels: [left, right],
            history: vec![vec![Complex::new(0.0, 0.0); size]; partitions],
            head: 0,
            window: vec![0.0; size],
            fill: 0,
            pending: [vec![0.0; partition], vec![0.0; partition]],
            scratch: vec![Complex::new(0.0, 0.0); size],
            accum: vec![Complex::new(0.0, 0.0); size],
        })
    }

    /// Partition size (and latency) in samples
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Push one input sample and pull one output frame
    pub fn process(&mut self, input: f64) -> Frame {
        let out = [self.pending[0][self.fill], self.pending[1][self.fill]];
        self.window[self.partition + self.fill] = input;
        self.fill += 1;

        if self.fill == self.partition {
            self.convolve_block();
            self.fill = 0;
        }

        out
    }

    fn convolve_block(&mut self) {
        let size = self.partition * 2;
        let partitions = self.history.len();

        // Transform [previous block | current block] into the delay line
        self.head = (self.head + partitions - 1) % partitions;
        let spectrum = &mut self.history[self.head];
        for (bin, &s) in spectrum.iter_mut().zip(&self.window) {
            *bin = Complex::new(s, 0.0);
        }
        self.fft.process(spectrum);
        self.window.copy_within(self.partition.., 0);

        let scale = 1.0 / size as f64;
        for channel in 0..2 {
            self.accum.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
            for (p, kernel) in self.kernels[channel].iter().enumerate() {
                let input = &self.history[(self.head + p) % partitions];
                for ((acc, &x), &h) in self.accum.iter_mut().zip(input).zip(kernel) {
                    *acc += x * h;
                }
            }

            self.scratch.copy_from_slice(&self.accum);
            self.ifft.process(&mut self.scratch);
            for (dst, src) in self.pending[channel]
                .iter_mut()
                .zip(&self.scratch[self.partition..])
            {
                *dst = src.re * scale;
            }
        }
    }
}
