//! Parameter automation timeline
//!
//! A parameter holds an ordered list of automation events on the audio
//! clock. Scheduling a new event cancels everything at or after its start
//! time, so a fresh ramp always supersedes one that is still in flight.

/// A scheduled change to a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    /// Jump to `value` at `time`
    Set { time: f64, value: f64 },
    /// Exponential curve from `from_value` at `start` to `to_value` at `end`
    ExpRamp {
        start: f64,
        end: f64,
        from_value: f64,
        to_value: f64,
    },
}

impl Event {
    fn start(&self) -> f64 {
        match *self {
            Event::Set { time, .. } => time,
            Event::ExpRamp { start, .. } => start,
        }
    }

    fn value_at(&self, t: f64) -> f64 {
        match *self {
            Event::Set { value, .. } => value,
            Event::ExpRamp {
                start,
                end,
                from_value,
                to_value,
            } => {
                if t >= end {
                    return to_value;
                }
                // Undefined when the endpoints straddle zero: hold the start value.
                if from_value == 0.0 || (from_value < 0.0) != (to_value < 0.0) {
                    return from_value;
                }
                let progress = ((t - start) / (end - start)).clamp(0.0, 1.0);
                from_value * (to_value / from_value).powf(progress)
            }
        }
    }
}

/// An automatable parameter (gain or frequency)
#[derive(Debug, Clone)]
pub struct AudioParam {
    initial: f64,
    events: Vec<Event>,
}

impl AudioParam {
    /// Create a parameter with a fixed initial value
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// Value of the automation timeline at `t` (without modulation)
    pub fn value_at(&self, t: f64) -> f64 {
        match self.events.iter().rev().find(|e| e.start() <= t) {
            Some(event) => event.value_at(t),
            None => self.initial,
        }
    }

    /// Jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.cancel_from(time);
        self.events.push(Event::Set { time, value });
    }

    /// Ramp exponentially from the instantaneous value at `start` to
    /// `target` at `end`.
    pub fn exponential_ramp(&mut self, target: f64, start: f64, end: f64) {
        let from_value = self.value_at(start);
        self.cancel_from(start);
        self.events.push(Event::ExpRamp {
            start,
            end,
            from_value,
            to_value: target,
        });
    }

    /// Drop events that can no longer affect values at or after `now`
    pub fn prune(&mut self, now: f64) {
        let live = self.events.iter().rposition(|e| e.start() <= now);
        if let Some(idx) = live {
            if idx > 0 {
                self.initial = self.events[idx - 1].value_at(now);
                self.events.drain(..idx);
            }
        }
    }

    /// Number of pending automation events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn cancel_from(&mut self, time: f64) {
        self.events.retain(|e| e.start() < time);
    }
}
