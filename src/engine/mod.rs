//! The playback engine — ties voices, modes, songs, scheduling, and the
//! effect buses to a [`ToneBackend`].
//!
//! The engine is clock-driven: hosts call [`Engine::advance`] (directly, or
//! via [`Engine::process`] when the bundled software backend renders audio)
//! and due actions fire against the backend. All note-on/note-off decisions
//! happen here; the backend only synthesizes.

pub mod bus;
pub mod scheduler;
pub mod voice;

use crate::backend::ToneBackend;
use crate::config::SynthConfig;
use crate::error::SynthError;
use crate::mode::{SoundMode, SoundModeRegistry};
use crate::song::{Song, SongLibrary};
use bus::EffectsBus;
use scheduler::{ActionKind, PlaybackStatus, SongScheduler};
use voice::VoiceManager;

pub struct Engine<B: ToneBackend> {
    backend: B,
    voices: VoiceManager,
    modes: SoundModeRegistry,
    songs: SongLibrary,
    scheduler: SongScheduler,
    bus: EffectsBus,
    config: SynthConfig,
}

impl<B: ToneBackend> Engine<B> {
    pub fn new(backend: B, config: SynthConfig) -> Self {
        let mut engine = Engine {
            backend,
            voices: VoiceManager::new(),
            modes: SoundModeRegistry::new(),
            songs: SongLibrary::new(),
            scheduler: SongScheduler::new(),
            bus: EffectsBus::new(),
            config: config.sanitized(),
        };
        engine.backend.set_master_gain(engine.config.master_gain);
        let (delay, reverb) = {
            let mode = engine.modes.current();
            (mode.delay_send, mode.reverb_send)
        };
        engine.bus.set_levels(&mut engine.backend, delay, reverb);
        engine
    }

    /// Start a voice for `note` under the current sound mode. Returns whether
    /// a new voice actually started (rests and already-held notes do not).
    pub fn trigger_note(&mut self, note: &str) -> Result<bool, SynthError> {
        self.backend.ensure_ready()?;
        let now = self.backend.now();
        let started = self
            .voices
            .trigger(&mut self.backend, note, self.modes.current(), now)?;
        Ok(started.is_some())
    }

    /// Begin the release of a held note; no-op when the note is not held.
    pub fn release_note(&mut self, note: &str) {
        let release = self.modes.current().envelope.release;
        let now = self.backend.now();
        self.voices.release(&mut self.backend, note, release, now);
    }

    /// Switch the current sound mode. Sounding voices (decay tails included)
    /// change waveform immediately but keep their envelope levels; the effect
    /// sends move to the new mode's levels.
    pub fn set_sound_mode(&mut self, name: &str) -> Result<(), SynthError> {
        let mode = self.modes.apply(name)?.clone();
        self.voices.retune(&mut self.backend, &mode);
        self.bus
            .set_levels(&mut self.backend, mode.delay_send, mode.reverb_send);
        Ok(())
    }

    /// Override the effect-send levels independently of the current mode.
    pub fn set_effect_levels(&mut self, delay: f64, reverb: f64) {
        self.bus.set_levels(&mut self.backend, delay, reverb);
    }

    pub fn set_master_gain(&mut self, gain: f64) {
        self.config.master_gain = gain.clamp(0.0, 1.0);
        self.backend.set_master_gain(self.config.master_gain);
    }

    /// Start playing a library song, superseding any current playback.
    ///
    /// Any running session is stopped synchronously before the id is even
    /// resolved, so a failed play (unknown id, malformed song) never leaves
    /// the old song running. The song is validated up front so a malformed
    /// song never half-plays. When the auto-apply policy is on, the song's
    /// preferred sound mode becomes current; a preference the registry does
    /// not know leaves the current mode in place.
    pub fn play_song(&mut self, id: &str) -> Result<(), SynthError> {
        self.backend.ensure_ready()?;
        self.stop_song();

        let song = self.songs.get(id)?.clone();
        song.validate()?;

        if self.config.auto_apply_song_mode {
            if let Some(preferred) = &song.mode {
                // A preference the registry does not know leaves the current
                // mode in place; the song still plays.
                if self.modes.apply(preferred).is_ok() {
                    let mode = self.modes.current().clone();
                    self.bus
                        .set_levels(&mut self.backend, mode.delay_send, mode.reverb_send);
                }
            }
        }

        let now = self.backend.now();
        self.scheduler.begin(&song, now, &self.config);
        Ok(())
    }

    /// Hard stop: cancel all pending song actions, kill every voice without
    /// a release tail, and flush the effect tails. Safe to call at any time,
    /// any number of times, from any state.
    pub fn stop_song(&mut self) {
        match self.scheduler.status() {
            PlaybackStatus::Playing | PlaybackStatus::Finished => {
                self.scheduler.cancel(PlaybackStatus::Stopped);
            }
            // Never played, or already stopped: nothing to report.
            PlaybackStatus::Idle | PlaybackStatus::Stopped => {}
        }
        self.voices.force_stop_all(&mut self.backend);
        self.backend.clear_tails();
    }

    /// Fire every scheduled action due at or before `now`, then forget voice
    /// tails that have finished. Actions are popped one at a time so firing
    /// one may safely reschedule or cancel the rest.
    pub fn advance(&mut self, now: f64) {
        while let Some(action) = self.scheduler.pop_due(now) {
            match action.kind {
                ActionKind::Trigger { note, progress } => {
                    self.scheduler.set_progress(progress);
                    // The song was validated, so the note parses; a backend
                    // that cannot start a generator just skips the note while
                    // the song keeps time.
                    let _ = self.voices.trigger(
                        &mut self.backend,
                        &note,
                        self.modes.current(),
                        action.at,
                    );
                }
                ActionKind::Release { note } => {
                    let release = self.modes.current().envelope.release;
                    self.voices
                        .release(&mut self.backend, &note, release, action.at);
                }
                ActionKind::Finish => {
                    self.scheduler.finish();
                }
            }
        }
        self.voices.prune(now);
    }

    /// Pull-model entry point for the software backend: fire due actions,
    /// render one block, then catch actions that became due inside it.
    /// Event timing is quantized to the block size.
    pub fn process(&mut self, out: &mut [f32]) {
        self.advance(self.backend.now());
        self.backend.render(out);
        self.advance(self.backend.now());
    }

    pub fn status(&self) -> PlaybackStatus {
        self.scheduler.status()
    }

    /// Playback progress in [0, 1]: last reported trigger position while
    /// playing, pinned at 1.0 when finished, reset to 0.0 when stopped.
    pub fn progress(&self) -> f64 {
        self.scheduler.progress()
    }

    pub fn current_song(&self) -> Option<&str> {
        self.scheduler.current_song()
    }

    pub fn current_mode(&self) -> &SoundMode {
        self.modes.current()
    }

    pub fn modes(&self) -> Vec<&SoundMode> {
        self.modes.all()
    }

    pub fn songs(&self) -> Vec<&Song> {
        self.songs.all()
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Sounding voices, decay tails included.
    pub fn voice_count(&self) -> usize {
        self.voices.sounding_count()
    }
}
