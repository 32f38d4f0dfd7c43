//! Phase-accumulating oscillator used by oscillator nodes

use std::f64::consts::PI;

/// Oscillator waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

/// A periodic waveform generator.
///
/// The frequency is supplied per sample so that automation and modulation
/// can move it continuously without resetting the phase.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    /// Create a new oscillator at phase zero
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Self {
            waveform,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Get the waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Generate the next sample at `frequency` Hz and advance the phase
    pub fn next(&mut self, frequency: f64) -> f64 {
        let p = self.phase;
        let sample = match self.waveform {
            Waveform::Sine => (p * 2.0 * PI).sin(),
            Waveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        // Modulation may push the frequency negative; wrap either way.
        self.phase = (self.phase + frequency / self.sample_rate).rem_euclid(1.0);

        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_starts_at_zero() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        assert!(osc.next(440.0).abs() < 1e-12);
    }

    #[test]
    fn test_square_cycle() {
        // 4 samples per cycle at 1 Hz, 4 Hz sample rate
        let mut osc = Oscillator::new(Waveform::Square, 4.0);
        assert_eq!(osc.next(1.0), 1.0);
        assert_eq!(osc.next(1.0), 1.0);
        assert_eq!(osc.next(1.0), -1.0);
        assert_eq!(osc.next(1.0), -1.0);
    }

    #[test]
    fn test_triangle_cycle() {
        let mut osc = Oscillator::new(Waveform::Triangle, 4.0);
        assert_eq!(osc.next(1.0), 0.0);
        assert_eq!(osc.next(1.0), 1.0);
        assert_eq!(osc.next(1.0), 0.0);
        assert_eq!(osc.next(1.0), -1.0);
    }

    #[test]
    fn test_sawtooth_cycle() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 4.0);
        assert_eq!(osc.next(1.0), -1.0);
        assert_eq!(osc.next(1.0), -0.5);
        assert_eq!(osc.next(1.0), 0.0);
        assert_eq!(osc.next(1.0), 0.5);
    }

    #[test]
    fn test_negative_frequency_wraps() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 4.0);
        osc.next(-1.0);
        // Phase wrapped from 0.0 to 0.75
        assert_eq!(osc.next(0.0), 0.5);
    }
}
