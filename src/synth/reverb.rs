//! Synthetic reverb impulse
//!
//! The impulse is white noise under a quartic decay envelope,
//! `noise * (1 - i/len)^4`, generated once per synthesizer. Exact sample
//! values depend on the generator; only the envelope shape is stable.

use rand::Rng;

use crate::graph::{GraphError, ImpulseResponse};

/// Number of impulse channels
pub const REVERB_CHANNELS: usize = 2;

/// Exponent of the decay envelope
const DECAY_POWER: i32 = 4;

/// Precomputed convolution kernel for the shared reverb
#[derive(Debug, Clone)]
pub struct ReverbUnit {
    impulse: ImpulseResponse,
}

impl ReverbUnit {
    /// Generate a stereo impulse of `seconds` at `sample_rate`
    pub fn generate<R: Rng>(
        sample_rate: f64,
        seconds: f64,
        rng: &mut R,
    ) -> Result<Self, GraphError> {
        let length = (sample_rate * seconds) as usize;
        let channels: Vec<Vec<f64>> = (0..REVERB_CHANNELS)
            .map(|_| {
                (0..length)
                    .map(|i| rng.random_range(-1.0f64..1.0) * decay_envelope(i, length))
                    .collect()
            })
            .collect();

        Ok(Self {
            impulse: ImpulseResponse::new(sample_rate, channels)?,
        })
    }

    /// The impulse response
    pub fn impulse(&self) -> &ImpulseResponse {
        &self.impulse
    }
}

/// Envelope value at sample `i` of `length`
pub fn decay_envelope(i: usize, length: usize) -> f64 {
    (1.0 - i as f64 / length as f64).powi(DECAY_POWER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_impulse_dimensions() {
        let mut rng = Pcg32::seed_from_u64(7);
        let reverb = ReverbUnit::generate(1000.0, 0.5, &mut rng).unwrap();

        assert_eq!(reverb.impulse().channel_count(), 2);
        assert_eq!(reverb.impulse().len(), 500);
    }

    #[test]
    fn test_samples_stay_under_envelope() {
        let mut rng = Pcg32::seed_from_u64(42);
        let reverb = ReverbUnit::generate(2000.0, 1.0, &mut rng).unwrap();
        let len = reverb.impulse().len();

        for channel in 0..2 {
            for (i, &s) in reverb.impulse().channel(channel).iter().enumerate() {
                assert!(s.abs() <= decay_envelope(i, len), "sample {i} escapes envelope");
            }
        }
    }

    #[test]
    fn test_tail_is_quieter_than_head() {
        let mut rng = Pcg32::seed_from_u64(3);
        let reverb = ReverbUnit::generate(4000.0, 1.0, &mut rng).unwrap();
        let samples = reverb.impulse().channel(0);

        let energy = |s: &[f64]| s.iter().map(|x| x * x).sum::<f64>();
        let head = energy(&samples[..400]);
        let tail = energy(&samples[samples.len() - 400..]);
        assert!(head > tail * 1000.0);
    }

    #[test]
    fn test_channels_are_decorrelated() {
        let mut rng = Pcg32::seed_from_u64(9);
        let reverb = ReverbUnit::generate(1000.0, 0.2, &mut rng).unwrap();
        assert_ne!(reverb.impulse().channel(0), reverb.impulse().channel(1));
    }

    #[test]
    fn test_envelope_shape() {
        assert_eq!(decay_envelope(0, 100), 1.0);
        assert!((decay_envelope(50, 100) - 0.0625).abs() < 1e-12);
        assert!(decay_envelope(99, 100) < 1e-7);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(ReverbUnit::generate(1000.0, 0.0, &mut rng).is_err());
    }
}
