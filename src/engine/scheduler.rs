//! Song scheduling — deferred trigger/release actions with race-free
//! cancellation.
//!
//! A playback session turns a song into a time-ordered list of deferred
//! actions. Every action is tagged with the session's generation; `stop` (and
//! a superseding `play`) bumps the generation and clears the queue, so an
//! action that somehow escapes cancellation self-cancels in O(1) when it is
//! popped under a newer generation.

use std::collections::VecDeque;

use crate::config::SynthConfig;
use crate::song::Song;

/// Playback state machine: Idle → Playing → (Finished | Stopped) → Idle.
/// `Finished` and `Stopped` are terminal report states; both count as
/// "not playing".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Finished,
    Stopped,
}

impl PlaybackStatus {
    pub fn is_playing(self) -> bool {
        self == PlaybackStatus::Playing
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Finished => "finished",
            PlaybackStatus::Stopped => "stopped",
        }
    }
}

/// What a deferred action does when it fires.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    /// Start a voice and report playback progress in [0, 1].
    Trigger { note: String, progress: f64 },
    /// Begin a voice's release.
    Release { note: String },
    /// The song's full duration has elapsed.
    Finish,
}

/// One deferred action, tagged with its session generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAction {
    pub at: f64,
    pub generation: u64,
    pub kind: ActionKind,
}

/// The active playback session, if any.
#[derive(Debug, Clone, PartialEq)]
struct Session {
    song_id: String,
}

/// Owns the pending-action queue, the generation counter, and the reported
/// status/progress.
#[derive(Debug)]
pub struct SongScheduler {
    /// Pending actions in non-decreasing `at` order.
    pending: VecDeque<ScheduledAction>,
    generation: u64,
    status: PlaybackStatus,
    session: Option<Session>,
    progress: f64,
}

impl SongScheduler {
    pub fn new() -> Self {
        SongScheduler {
            pending: VecDeque::new(),
            generation: 0,
            status: PlaybackStatus::Idle,
            session: None,
            progress: 0.0,
        }
    }

    /// Cancel whatever is pending: clears the queue, bumps the generation
    /// (invalidating any action already popped elsewhere), resets progress.
    /// Idempotent. The caller decides the resulting status.
    pub fn cancel(&mut self, status: PlaybackStatus) {
        self.pending.clear();
        self.generation += 1;
        self.session = None;
        self.progress = 0.0;
        self.status = status;
    }

    /// Start a session for `song` at absolute time `now`, scheduling a
    /// trigger and a release per non-rest event plus a final finish action.
    /// Any previous session must already have been cancelled.
    pub fn begin(&mut self, song: &Song, now: f64, config: &SynthConfig) {
        debug_assert!(self.pending.is_empty());
        self.generation += 1;
        let generation = self.generation;

        let beat = song.beat_seconds();
        let total = song.duration_seconds();
        let mut elapsed = 0.0;

        let mut actions = Vec::new();
        for event in &song.events {
            let duration = event.beats * beat;
            if !event.is_rest() {
                let progress = if total > 0.0 { elapsed / total } else { 1.0 };
                actions.push(ScheduledAction {
                    at: now + elapsed,
                    generation,
                    kind: ActionKind::Trigger {
                        note: event.pitch.clone(),
                        progress,
                    },
                });
                // Release slightly before the note's full duration so the
                // tail does not smear into the next note.
                actions.push(ScheduledAction {
                    at: now + elapsed + duration * config.release_fraction,
                    generation,
                    kind: ActionKind::Release {
                        note: event.pitch.clone(),
                    },
                });
            }
            elapsed += duration;
        }
        actions.push(ScheduledAction {
            at: now + total,
            generation,
            kind: ActionKind::Finish,
        });
        actions.sort_by(|a, b| a.at.total_cmp(&b.at));
        self.pending = actions.into();

        self.session = Some(Session {
            song_id: song.id.clone(),
        });
        self.status = PlaybackStatus::Playing;
        self.progress = 0.0;
    }

    /// Pop the next action due at or before `now`, skipping any action from
    /// a superseded generation. Pops one action at a time so a handler that
    /// re-enters the scheduler (e.g. a stop) stays safe.
    pub fn pop_due(&mut self, now: f64) -> Option<ScheduledAction> {
        while self.pending.front().is_some_and(|a| a.at <= now) {
            if let Some(action) = self.pending.pop_front() {
                if action.generation == self.generation {
                    return Some(action);
                }
            }
        }
        None
    }

    /// Mark the session finished: queue already drained, progress pinned at
    /// 1.0. The generation is bumped so stragglers die.
    pub fn finish(&mut self) {
        self.pending.clear();
        self.generation += 1;
        self.session = None;
        self.status = PlaybackStatus::Finished;
        self.progress = 1.0;
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_song(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.song_id.as_str())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for SongScheduler {
    fn default() -> Self {
        Self::new()
    }
}
