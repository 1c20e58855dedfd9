//! Band-limited waveform generation for the software tone backend.
//!
//! Square and sawtooth use PolyBLEP correction at their discontinuities;
//! sine and triangle are computed directly from phase.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// The waveform shapes a sound mode can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A single oscillator running at a fixed frequency.
///
/// Phase is kept in [0, 1); the waveform can be switched live without
/// resetting phase, which is what keeps a mid-note timbre change click-free.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    phase: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f64) -> Self {
        Oscillator {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    /// Advance one sample at the given sample rate and return the output.
    pub fn tick(&mut self, sample_rate: f64) -> f64 {
        let inc = self.frequency / sample_rate;
        let out = sample(self.waveform, self.phase, inc);
        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }
}

/// Evaluate one waveform sample at `phase` with phase increment `inc`.
fn sample(waveform: Waveform, phase: f64, inc: f64) -> f64 {
    match waveform {
        Waveform::Sine => (2.0 * PI * phase).sin(),
        Waveform::Sawtooth => {
            // Naive ramp -1..+1 with the wrap discontinuity corrected.
            (2.0 * phase - 1.0) - poly_blep(phase, inc)
        }
        Waveform::Square => {
            let naive = if phase < 0.5 { 1.0 } else { -1.0 };
            naive + poly_blep(phase, inc) - poly_blep((phase + 0.5) % 1.0, inc)
        }
        Waveform::Triangle => {
            if phase < 0.5 {
                4.0 * phase - 1.0
            } else {
                3.0 - 4.0 * phase
            }
        }
    }
}

/// PolyBLEP step correction around a discontinuity at phase 0.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}
