//! Speed control
//!
//! The speed multiplier the synthesizer follows. It starts at 1.0, moves in
//! fixed steps and never drops below 1.0.

use anyhow::{bail, Result};

use crate::config::SpeedConfig;

/// Slowest reachable multiplier
pub const MIN_SPEED: f64 = 1.0;

/// Stepped speed multiplier
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedControl {
    level: f64,
    step: f64,
    max: f64,
}

impl SpeedControl {
    /// Create a control at 1.0
    pub fn new(step: f64, max: f64) -> Self {
        Self {
            level: MIN_SPEED,
            step,
            max: max.max(MIN_SPEED),
        }
    }

    pub fn from_config(config: &SpeedConfig) -> Self {
        Self::new(config.step, config.max)
    }

    /// Current multiplier
    pub fn multiplier(&self) -> f64 {
        self.level
    }

    /// Step up; returns the new multiplier
    pub fn increase(&mut self) -> f64 {
        self.level = (self.level + self.step).min(self.max);
        self.level
    }

    /// Step down, stopping at 1.0; returns the new multiplier
    pub fn decrease(&mut self) -> f64 {
        self.level = (self.level - self.step).max(MIN_SPEED);
        self.level
    }

    /// Jump to `multiplier`, clamped to the reachable range.
    ///
    /// Non-positive or non-finite multipliers are rejected.
    pub fn set(&mut self, multiplier: f64) -> Result<f64> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            bail!("Speed {} is not a positive number", multiplier);
        }
        self.level = multiplier.clamp(MIN_SPEED, self.max);
        Ok(self.level)
    }

    /// Back to 1.0
    pub fn reset(&mut self) {
        self.level = MIN_SPEED;
    }

    /// Multiplier with one decimal, e.g. `"2.0"`
    pub fn label(&self) -> String {
        format!("{:.1}", self.level)
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self::from_config(&SpeedConfig::default())
    }
}

/// A sequence of speeds, each held for the same duration
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedSchedule {
    speeds: Vec<f64>,
    hold_secs: f64,
}

impl SpeedSchedule {
    /// Build a schedule, rejecting non-positive speeds or hold time
    pub fn new(speeds: Vec<f64>, hold_secs: f64) -> Result<Self> {
        if speeds.is_empty() {
            bail!("Speed schedule needs at least one speed");
        }
        if let Some(bad) = speeds.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            bail!("Speed {} is not a positive number", bad);
        }
        if !(hold_secs > 0.0) {
            bail!("Hold time must be positive");
        }
        Ok(Self { speeds, hold_secs })
    }

    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    pub fn hold_secs(&self) -> f64 {
        self.hold_secs
    }

    /// Total duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.speeds.len() as f64 * self.hold_secs
    }

    /// The speed in effect at `t` seconds (the last one holds forever)
    pub fn speed_at(&self, t: f64) -> f64 {
        let idx = (t / self.hold_secs).floor().max(0.0) as usize;
        self.speeds[idx.min(self.speeds.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one() {
        let control = SpeedControl::default();
        assert_eq!(control.multiplier(), 1.0);
        assert_eq!(control.label(), "1.0");
    }

    #[test]
    fn test_increase_and_decrease() {
        let mut control = SpeedControl::new(1.0, 20.0);
        assert_eq!(control.increase(), 2.0);
        assert_eq!(control.increase(), 3.0);
        assert_eq!(control.decrease(), 2.0);
        assert_eq!(control.label(), "2.0");
    }

    #[test]
    fn test_never_drops_below_one() {
        let mut control = SpeedControl::new(1.0, 20.0);
        assert_eq!(control.decrease(), 1.0);
        assert_eq!(control.decrease(), 1.0);
    }

    #[test]
    fn test_caps_at_max() {
        let mut control = SpeedControl::new(4.0, 10.0);
        control.increase();
        control.increase();
        assert_eq!(control.increase(), 10.0);

        control.reset();
        assert_eq!(control.multiplier(), 1.0);
    }

    #[test]
    fn test_set_clamps() {
        let mut control = SpeedControl::new(1.0, 8.0);
        assert_eq!(control.set(3.5).unwrap(), 3.5);
        assert_eq!(control.set(0.2).unwrap(), 1.0);
        assert_eq!(control.set(50.0).unwrap(), 8.0);
    }

    #[test]
    fn test_set_rejects_invalid_speed() {
        let mut control = SpeedControl::new(1.0, 8.0);
        control.set(4.0).unwrap();

        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(control.set(bad).is_err());
        }
        assert_eq!(control.multiplier(), 4.0);
    }

    #[test]
    fn test_schedule_lookup() {
        let schedule = SpeedSchedule::new(vec![1.0, 2.0, 4.0], 5.0).unwrap();
        assert_eq!(schedule.duration_secs(), 15.0);
        assert_eq!(schedule.speed_at(0.0), 1.0);
        assert_eq!(schedule.speed_at(4.99), 1.0);
        assert_eq!(schedule.speed_at(5.0), 2.0);
        assert_eq!(schedule.speed_at(14.0), 4.0);
        assert_eq!(schedule.speed_at(100.0), 4.0);
    }

    #[test]
    fn test_schedule_validation() {
        assert!(SpeedSchedule::new(vec![], 1.0).is_err());
        assert!(SpeedSchedule::new(vec![1.0, 0.0], 1.0).is_err());
        assert!(SpeedSchedule::new(vec![1.0], 0.0).is_err());
    }
}
