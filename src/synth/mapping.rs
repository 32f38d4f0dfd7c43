//! Intensity mapping
//!
//! Maps the speed multiplier onto a frequency and gain target per voice.
//! Low voices drop in level as speed rises while their pitch climbs; high
//! voices rise in both.

use super::{Layer, SynthError};

/// A validated intensity multiplier (finite, strictly positive)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Intensity(f64);

impl Intensity {
    /// The neutral multiplier
    pub const UNIT: Intensity = Intensity(1.0);

    /// Validate a raw multiplier
    pub fn new(multiplier: f64) -> Result<Self, SynthError> {
        if multiplier.is_finite() && multiplier > 0.0 {
            Ok(Self(multiplier))
        } else {
            Err(SynthError::InvalidIntensity(multiplier))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// How a layer's gain responds to intensity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainResponse {
    /// `max(floor, level / m)`
    Inverse { level: f64, floor: f64 },
    /// `min(ceiling, level * m)`
    Direct { level: f64, ceiling: f64 },
}

impl GainResponse {
    fn apply(self, m: f64) -> f64 {
        match self {
            GainResponse::Inverse { level, floor } => (level / m).max(floor),
            GainResponse::Direct { level, ceiling } => (level * m).min(ceiling),
        }
    }
}

/// Frequency and gain a voice ramps towards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceTarget {
    pub frequency: f64,
    pub gain: f64,
}

impl VoiceTarget {
    /// Whether both values are valid exponential ramp endpoints
    pub fn is_rampable(&self) -> bool {
        [self.frequency, self.gain]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Per-layer mapping from intensity to voice targets.
///
/// Voice `i` of the layer targets `min((base + i * step) * m, ceiling)` Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityCurve {
    pub base: f64,
    pub step: f64,
    pub ceiling: f64,
    pub gain: GainResponse,
}

impl IntensityCurve {
    /// Curve for the low (ocean) layer
    pub const LOW: IntensityCurve = IntensityCurve {
        base: 25.0,
        step: 5.0,
        ceiling: 150.0,
        gain: GainResponse::Inverse {
            level: 0.15,
            floor: 0.02,
        },
    };

    /// Curve for the high (atmosphere) layer
    pub const HIGH: IntensityCurve = IntensityCurve {
        base: 55.0,
        step: 10.0,
        ceiling: 300.0,
        gain: GainResponse::Direct {
            level: 0.05,
            ceiling: 0.2,
        },
    };

    pub fn for_layer(layer: Layer) -> Self {
        match layer {
            Layer::Low => Self::LOW,
            Layer::High => Self::HIGH,
        }
    }

    /// Target for voice `index` of this layer at `intensity`
    pub fn target(&self, index: usize, intensity: Intensity) -> VoiceTarget {
        let m = intensity.value();
        VoiceTarget {
            frequency: ((self.base + index as f64 * self.step) * m).min(self.ceiling),
            gain: self.gain.apply(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(layer: Layer, index: usize, m: f64) -> VoiceTarget {
        IntensityCurve::for_layer(layer).target(index, Intensity::new(m).unwrap())
    }

    #[test]
    fn test_intensity_validation() {
        assert!(Intensity::new(0.0).is_err());
        assert!(Intensity::new(-1.0).is_err());
        assert!(Intensity::new(f64::NAN).is_err());
        assert!(Intensity::new(f64::INFINITY).is_err());
        assert_eq!(Intensity::new(2.5).unwrap().value(), 2.5);
    }

    #[test]
    fn test_unit_intensity_is_identity_on_gain() {
        for i in 0..5 {
            assert_eq!(target(Layer::Low, i, 1.0).gain, 0.15);
            assert_eq!(target(Layer::High, i, 1.0).gain, 0.05);
        }
        assert_eq!(target(Layer::Low, 2, 1.0).frequency, 35.0);
        assert_eq!(target(Layer::High, 3, 1.0).frequency, 85.0);
    }

    #[test]
    fn test_half_speed() {
        let low = target(Layer::Low, 0, 0.5);
        assert_eq!(low.frequency, 12.5);
        assert!((low.gain - 0.30).abs() < 1e-12);

        let high = target(Layer::High, 0, 0.5);
        assert_eq!(high.frequency, 27.5);
        assert!((high.gain - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_high_speed_clamps() {
        assert_eq!(target(Layer::Low, 4, 10.0).frequency, 150.0);
        assert_eq!(target(Layer::Low, 4, 10.0).gain, 0.02);
        assert_eq!(target(Layer::High, 4, 10.0).gain, 0.2);
        assert_eq!(target(Layer::High, 4, 10.0).frequency, 300.0);
    }

    #[test]
    fn test_formula_across_range() {
        for step in 1..=80 {
            let m = step as f64 * 0.25;
            for i in 0..5 {
                let low = target(Layer::Low, i, m);
                assert_eq!(low.frequency, ((25.0 + 5.0 * i as f64) * m).min(150.0));
                assert_eq!(low.gain, (0.15 / m).max(0.02));

                let high = target(Layer::High, i, m);
                assert_eq!(high.frequency, ((55.0 + 10.0 * i as f64) * m).min(300.0));
                assert_eq!(high.gain, (0.05 * m).min(0.2));
            }
        }
    }

    #[test]
    fn test_overflowing_targets_are_not_rampable() {
        let low = target(Layer::Low, 0, 1e-310);
        assert!(low.gain.is_infinite());
        assert!(!low.is_rampable());
        assert!(target(Layer::High, 0, 1e-310).is_rampable());
        assert!(target(Layer::Low, 0, 1.0).is_rampable());
    }

    #[test]
    fn test_targets_are_always_positive() {
        for &m in &[1e-6, 0.01, 1.0, 1e6] {
            for layer in [Layer::Low, Layer::High] {
                let t = target(layer, 4, m);
                assert!(t.frequency > 0.0 && t.gain > 0.0);
            }
        }
    }
}
