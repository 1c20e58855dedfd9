//! Shared effect-send levels.

use crate::backend::ToneBackend;

/// Input attenuation into the delay loop. The loop re-feeds its output, so
/// the send is padded down to keep repeats from stacking up to full scale.
const DELAY_INPUT_SCALE: f64 = 0.7;

/// The per-mode delay and reverb send levels shared by every voice. Values
/// are clamped to [0, 1]; the delay input is additionally scaled before it
/// reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectsBus {
    delay: f64,
    reverb: f64,
}

impl EffectsBus {
    pub fn new() -> Self {
        EffectsBus {
            delay: 0.0,
            reverb: 0.0,
        }
    }

    /// Clamp and store the new levels, then push them to the backend.
    pub fn set_levels(&mut self, backend: &mut dyn ToneBackend, delay: f64, reverb: f64) {
        self.delay = delay.clamp(0.0, 1.0);
        self.reverb = reverb.clamp(0.0, 1.0);
        backend.set_bus_levels(self.delay * DELAY_INPUT_SCALE, self.reverb);
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn reverb(&self) -> f64 {
        self.reverb
    }
}

impl Default for EffectsBus {
    fn default() -> Self {
        Self::new()
    }
}
