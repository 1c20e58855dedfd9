//! Engine policy constants.

use serde::{Deserialize, Serialize};

/// Tunable playback policy. The defaults reproduce the original desktop
/// synth's behavior; the fields that source variants disagreed on are
/// configurable rather than baked in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Audio sample rate in Hz, used by the bundled software backend.
    pub sample_rate: f64,
    /// Master output gain.
    pub master_gain: f64,
    /// Fraction of a note's duration after which its release begins, so the
    /// release starts slightly before the next note for articulation.
    /// Always < 1.
    pub release_fraction: f64,
    /// Whether `play_song` applies the song's preferred sound mode.
    pub auto_apply_song_mode: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            sample_rate: 44100.0,
            master_gain: 0.7,
            release_fraction: 0.9,
            auto_apply_song_mode: true,
        }
    }
}

impl SynthConfig {
    /// Clamp fields into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.release_fraction = self.release_fraction.clamp(0.1, 0.99);
        self.master_gain = self.master_gain.clamp(0.0, 1.0);
        if !(self.sample_rate > 0.0) {
            self.sample_rate = 44100.0;
        }
        self
    }
}
