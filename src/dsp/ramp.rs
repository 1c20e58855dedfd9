//! Gain automation timeline with linear ramps.
//!
//! Models the scheduled-value semantics the engine needs for envelopes:
//! anchor a value at a time, ramp linearly to a new value by a later time,
//! and cancel-and-hold at an arbitrary point (used when a release interrupts
//! an in-flight attack or decay). Evaluation is pure: `level_at` never
//! mutates, so the same line can be sampled repeatedly during rendering.

/// One anchor point on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    time: f64,
    level: f64,
}

/// A piecewise-linear gain line.
#[derive(Debug, Clone)]
pub struct GainLine {
    /// Anchors in non-decreasing time order.
    anchors: Vec<Anchor>,
}

impl GainLine {
    /// A line holding `level` for all time until further automation.
    pub fn new(level: f64) -> Self {
        GainLine {
            anchors: vec![Anchor { time: 0.0, level }],
        }
    }

    /// Pin the line to `level` at `time`, discarding any later automation.
    pub fn set_value_at(&mut self, level: f64, time: f64) {
        self.anchors.retain(|a| a.time < time);
        self.anchors.push(Anchor { time, level });
    }

    /// Ramp linearly from the previous anchor to `level`, arriving at `time`.
    ///
    /// A ramp scheduled at or before the last anchor replaces everything
    /// from that point on.
    pub fn ramp_to(&mut self, level: f64, time: f64) {
        self.anchors.retain(|a| a.time < time);
        self.anchors.push(Anchor { time, level });
    }

    /// Freeze the line at its value as of `time`; later anchors are dropped.
    pub fn cancel_and_hold_at(&mut self, time: f64) {
        let held = self.level_at(time);
        self.anchors.retain(|a| a.time < time);
        self.anchors.push(Anchor { time, level: held });
    }

    /// The line's value at `time`, interpolating linearly between anchors.
    pub fn level_at(&self, time: f64) -> f64 {
        match self.anchors.iter().position(|a| a.time > time) {
            // Before the first anchor: its level holds backwards.
            Some(0) => self.anchors[0].level,
            Some(i) => {
                let lo = self.anchors[i - 1];
                let hi = self.anchors[i];
                let span = hi.time - lo.time;
                if span <= 0.0 {
                    hi.level
                } else {
                    let t = (time - lo.time) / span;
                    lo.level + (hi.level - lo.level) * t
                }
            }
            // Past the last anchor: final level holds forward.
            None => self.anchors.last().map(|a| a.level).unwrap_or(0.0),
        }
    }
}
