//! Voice lifecycle — one sounding note per note name.
//!
//! The [`VoiceManager`] owns every live [`ToneVoice`]. A released voice
//! leaves the active table immediately (so the same note can retrigger at
//! once) but keeps sounding on a releasing list until its scheduled stop
//! passes — that is the audible decay tail.

use std::collections::HashMap;

use crate::backend::{Destination, EnvelopeId, GeneratorId, NodeRef, ToneBackend};
use crate::error::SynthError;
use crate::mode::SoundMode;
use crate::pitch;

/// Margin between the end of the release ramp and the generator stop, so the
/// ramp has fully reached zero before the oscillator dies.
const STOP_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Triggered,
    Releasing,
    Stopped,
}

/// One sounding note: a generator plus its envelope.
#[derive(Debug, Clone)]
pub struct ToneVoice {
    pub note: String,
    pub generator: GeneratorId,
    pub envelope: EnvelopeId,
    pub started_at: f64,
    pub state: VoiceState,
    /// When the generator is due to stop; infinity while still held.
    stop_at: f64,
}

/// Tracks all currently sounding voices keyed by note name.
#[derive(Debug, Default)]
pub struct VoiceManager {
    active: HashMap<String, ToneVoice>,
    releasing: Vec<ToneVoice>,
}

impl VoiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a voice for `note` under `mode`.
    ///
    /// Returns `Ok(None)` without side effects when the note is already
    /// active (at most one voice per note), is the rest sentinel, or maps to
    /// frequency zero. Fails with `InvalidNote` for an unparseable name and
    /// `GeneratorUnavailable` when the backend cannot produce sound yet.
    pub fn trigger(
        &mut self,
        backend: &mut dyn ToneBackend,
        note: &str,
        mode: &SoundMode,
        now: f64,
    ) -> Result<Option<GeneratorId>, SynthError> {
        if self.active.contains_key(note) {
            return Ok(None);
        }
        let frequency = pitch::frequency_of(note)?;
        if frequency == 0.0 {
            return Ok(None);
        }

        let generator = backend.create_generator(mode.waveform, frequency)?;
        let envelope = backend.create_envelope();
        backend.connect(NodeRef::Generator(generator), Destination::Envelope(envelope));
        backend.connect(NodeRef::Envelope(envelope), Destination::Master);
        backend.connect(NodeRef::Envelope(envelope), Destination::Delay);
        backend.connect(NodeRef::Envelope(envelope), Destination::Reverb);

        // Attack 0 → 1, decay 1 → sustain; release comes later.
        let env = &mode.envelope;
        backend.set_level_at(envelope, 0.0, now);
        backend.ramp_to(envelope, 1.0, now + env.attack);
        backend.ramp_to(envelope, env.sustain, now + env.attack + env.decay);
        backend.start(generator, now);

        self.active.insert(
            note.to_string(),
            ToneVoice {
                note: note.to_string(),
                generator,
                envelope,
                started_at: now,
                state: VoiceState::Triggered,
                stop_at: f64::INFINITY,
            },
        );
        Ok(Some(generator))
    }

    /// Release `note`: ramp its envelope from the current level to zero over
    /// `release` seconds and stop the generator once the ramp is done. The
    /// note becomes retriggerable immediately.
    pub fn release(&mut self, backend: &mut dyn ToneBackend, note: &str, release: f64, now: f64) {
        let Some(mut voice) = self.active.remove(note) else {
            return;
        };
        backend.cancel_and_hold(voice.envelope, now);
        backend.ramp_to(voice.envelope, 0.0, now + release);
        let stop_at = now + release + STOP_EPSILON;
        backend.schedule_stop(voice.generator, stop_at);
        voice.state = VoiceState::Releasing;
        voice.stop_at = stop_at;
        self.releasing.push(voice);
    }

    /// Stop everything immediately — no release tails, active set cleared.
    /// The hard-cancellation path; never errors.
    pub fn force_stop_all(&mut self, backend: &mut dyn ToneBackend) {
        for voice in self.active.values() {
            backend.stop_now(voice.generator);
        }
        for voice in &self.releasing {
            backend.stop_now(voice.generator);
        }
        self.active.clear();
        self.releasing.clear();
    }

    /// Switch the waveform of every sounding voice (decay tails included)
    /// without touching envelopes, so a mid-note mode change keeps level
    /// continuity.
    pub fn retune(&mut self, backend: &mut dyn ToneBackend, mode: &SoundMode) {
        for voice in self.active.values() {
            backend.set_waveform(voice.generator, mode.waveform);
        }
        for voice in &self.releasing {
            backend.set_waveform(voice.generator, mode.waveform);
        }
    }

    /// Forget releasing voices whose stop time has passed.
    pub fn prune(&mut self, now: f64) {
        self.releasing.retain(|v| v.stop_at > now);
    }

    pub fn is_active(&self, note: &str) -> bool {
        self.active.contains_key(note)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Sounding voices including decay tails.
    pub fn sounding_count(&self) -> usize {
        self.active.len() + self.releasing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{Call, RecordingBackend};
    use crate::dsp::oscillator::Waveform;
    use crate::mode::SoundModeRegistry;
    use approx::assert_abs_diff_eq;

    fn retro() -> SoundMode {
        let mut registry = SoundModeRegistry::new();
        registry.apply("retro-game").unwrap().clone()
    }

    #[test]
    fn trigger_wires_generator_through_envelope_to_all_sends() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        let handle = voices.trigger(&mut backend, "A4", &mode, 0.0).unwrap();
        let generator = handle.expect("should start a voice");

        assert!(matches!(
            backend.calls[0],
            Call::CreateGenerator(Waveform::Square, f) if (f - 440.0).abs() < 1e-9
        ));
        let connects = backend.calls_of(|c| matches!(c, Call::Connect(..)));
        assert_eq!(connects.len(), 4);
        assert_eq!(backend.running_count(), 1);
        assert!(voices.is_active("A4"));

        // Envelope reaches 1.0 at the end of the attack, sustain after decay.
        let env = match backend.calls[1] {
            Call::CreateEnvelope => crate::backend::EnvelopeId(1),
            _ => panic!("expected envelope creation right after the generator"),
        };
        assert_abs_diff_eq!(backend.level_at(env, mode.envelope.attack), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            backend.level_at(env, mode.envelope.attack + mode.envelope.decay),
            mode.envelope.sustain,
            epsilon = 1e-9
        );
        let _ = generator;
    }

    #[test]
    fn duplicate_trigger_is_a_noop() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        assert!(voices.trigger(&mut backend, "C4", &mode, 0.0).unwrap().is_some());
        assert!(voices.trigger(&mut backend, "C4", &mode, 0.1).unwrap().is_none());
        assert_eq!(voices.active_count(), 1);
        assert_eq!(backend.running_count(), 1);
    }

    #[test]
    fn rest_trigger_is_a_noop() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        assert!(voices.trigger(&mut backend, "R", &mode, 0.0).unwrap().is_none());
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn invalid_note_is_rejected() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        let err = voices.trigger(&mut backend, "Q7", &mode, 0.0).unwrap_err();
        assert!(matches!(err, SynthError::InvalidNote { .. }));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn unready_backend_is_surfaced_not_tracked() {
        let mut backend = RecordingBackend::new();
        backend.ready = false;
        let mut voices = VoiceManager::new();
        let mode = retro();

        let err = voices.trigger(&mut backend, "C4", &mode, 0.0).unwrap_err();
        assert_eq!(err, SynthError::GeneratorUnavailable);
        assert_eq!(voices.sounding_count(), 0);
    }

    #[test]
    fn release_schedules_stop_and_frees_the_note() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        voices.trigger(&mut backend, "E4", &mode, 0.0).unwrap();
        voices.release(&mut backend, "E4", mode.envelope.release, 1.0);

        assert!(!voices.is_active("E4"), "released note leaves the active set");
        assert_eq!(voices.sounding_count(), 1, "but keeps decaying");
        let stops = backend.calls_of(|c| matches!(c, Call::ScheduleStop(..)));
        assert_eq!(stops.len(), 1);
        if let Call::ScheduleStop(_, at) = stops[0] {
            assert_abs_diff_eq!(*at, 1.0 + mode.envelope.release + STOP_EPSILON);
        }

        // Same note can retrigger immediately.
        assert!(voices.trigger(&mut backend, "E4", &mode, 1.01).unwrap().is_some());
        assert_eq!(voices.sounding_count(), 2);
    }

    #[test]
    fn release_holds_level_then_ramps_to_zero() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mut mode = retro();
        mode.envelope.attack = 0.1;

        voices.trigger(&mut backend, "G4", &mode, 0.0).unwrap();
        let env = EnvelopeId(1);
        // Mid-attack the level is half way up.
        assert_abs_diff_eq!(backend.level_at(env, 0.05), 0.5, epsilon = 1e-9);

        // Release in the middle of the attack: hold at 0.5, ramp to 0.
        voices.release(&mut backend, "G4", 0.2, 0.05);
        assert_abs_diff_eq!(backend.level_at(env, 0.05), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(backend.level_at(env, 0.15), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(backend.level_at(env, 0.25), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn release_of_inactive_note_is_a_noop() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        voices.release(&mut backend, "C4", 0.3, 0.0);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn force_stop_all_clears_everything() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        voices.trigger(&mut backend, "C4", &mode, 0.0).unwrap();
        voices.trigger(&mut backend, "E4", &mode, 0.0).unwrap();
        voices.release(&mut backend, "C4", 0.3, 0.1);

        voices.force_stop_all(&mut backend);
        assert_eq!(voices.sounding_count(), 0);
        assert_eq!(backend.running_count(), 0);
        let stop_nows = backend.calls_of(|c| matches!(c, Call::StopNow(..)));
        assert_eq!(stop_nows.len(), 2);
    }

    #[test]
    fn retune_changes_waveforms_without_envelope_calls() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        voices.trigger(&mut backend, "C4", &mode, 0.0).unwrap();
        voices.trigger(&mut backend, "E4", &mode, 0.0).unwrap();
        voices.release(&mut backend, "C4", 0.3, 0.1);

        let mut registry = SoundModeRegistry::new();
        let dreamy = registry.apply("dreamy").unwrap().clone();
        let before = backend.calls.len();
        voices.retune(&mut backend, &dreamy);

        let after = &backend.calls[before..];
        let waveform_calls = after
            .iter()
            .filter(|c| matches!(c, Call::SetWaveform(_, Waveform::Sine)))
            .count();
        assert_eq!(waveform_calls, 2, "active and releasing voices retuned");
        assert!(
            after.iter().all(|c| matches!(c, Call::SetWaveform(..))),
            "retune must not touch envelopes"
        );
    }

    #[test]
    fn prune_forgets_finished_tails() {
        let mut backend = RecordingBackend::new();
        let mut voices = VoiceManager::new();
        let mode = retro();

        voices.trigger(&mut backend, "C4", &mode, 0.0).unwrap();
        voices.release(&mut backend, "C4", 0.2, 0.0);
        assert_eq!(voices.sounding_count(), 1);

        voices.prune(0.1);
        assert_eq!(voices.sounding_count(), 1, "still decaying");
        voices.prune(0.3);
        assert_eq!(voices.sounding_count(), 0);
    }
}
