//! Sound modes — named bundles of timbre, envelope, and effect-send levels.
//!
//! The registry is fixed at construction; the "current mode" is the one piece
//! of process-wide mutable state, read by every voice trigger and replaced
//! wholesale by [`SoundModeRegistry::apply`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::SynthError;

/// ADSR envelope parameters applied to every triggered voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level in [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl EnvelopeParams {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        EnvelopeParams {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
        }
    }
}

/// One named timbre bundle. Immutable once defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundMode {
    pub name: String,
    pub waveform: Waveform,
    pub envelope: EnvelopeParams,
    /// Delay send level in [0, 1].
    pub delay_send: f64,
    /// Reverb send level in [0, 1].
    pub reverb_send: f64,
}

impl SoundMode {
    fn new(
        name: &str,
        waveform: Waveform,
        envelope: EnvelopeParams,
        delay_send: f64,
        reverb_send: f64,
    ) -> Self {
        SoundMode {
            name: name.to_string(),
            waveform,
            envelope,
            delay_send: delay_send.clamp(0.0, 1.0),
            reverb_send: reverb_send.clamp(0.0, 1.0),
        }
    }
}

/// The default mode selected at engine init.
pub const DEFAULT_MODE: &str = "soft-keys";

/// Registry of the built-in sound modes plus the currently selected one.
#[derive(Debug, Clone)]
pub struct SoundModeRegistry {
    modes: HashMap<String, SoundMode>,
    current: String,
}

impl SoundModeRegistry {
    /// Build the registry with the four built-in modes, `soft-keys` current.
    pub fn new() -> Self {
        let mut modes = HashMap::new();
        for mode in builtin_modes() {
            modes.insert(mode.name.clone(), mode);
        }
        SoundModeRegistry {
            modes,
            current: DEFAULT_MODE.to_string(),
        }
    }

    /// Make `name` the current mode and return it.
    ///
    /// On an unknown name the previous mode stays in effect.
    pub fn apply(&mut self, name: &str) -> Result<&SoundMode, SynthError> {
        if !self.modes.contains_key(name) {
            return Err(SynthError::UnknownMode {
                name: name.to_string(),
            });
        }
        self.current = name.to_string();
        Ok(&self.modes[name])
    }

    /// The mode every voice trigger reads.
    pub fn current(&self) -> &SoundMode {
        &self.modes[&self.current]
    }

    /// All registered modes, sorted by name for stable listings.
    pub fn all(&self) -> Vec<&SoundMode> {
        let mut modes: Vec<&SoundMode> = self.modes.values().collect();
        modes.sort_by(|a, b| a.name.cmp(&b.name));
        modes
    }
}

impl Default for SoundModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_modes() -> Vec<SoundMode> {
    vec![
        SoundMode::new(
            "retro-game",
            Waveform::Square,
            EnvelopeParams::new(0.01, 0.1, 0.6, 0.2),
            0.0,
            0.2,
        ),
        SoundMode::new(
            "soft-keys",
            Waveform::Sine,
            EnvelopeParams::new(0.05, 0.1, 0.8, 0.3),
            0.0,
            0.0,
        ),
        SoundMode::new(
            "dreamy",
            Waveform::Sine,
            EnvelopeParams::new(0.2, 0.3, 0.7, 0.5),
            0.3,
            0.6,
        ),
        SoundMode::new(
            "sharp",
            Waveform::Sawtooth,
            EnvelopeParams::new(0.01, 0.1, 0.5, 0.1),
            0.0,
            0.1,
        ),
    ]
}
