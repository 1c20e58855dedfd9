//! Songs — declarative tempo + note/duration sequences, and the built-in
//! library the player offers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;
use crate::pitch::{self, REST};

/// One step of a song: a pitch (or the rest sentinel) held for a number of
/// beats. Rests produce no sound but still consume time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongEvent {
    pub pitch: String,
    pub beats: f64,
}

impl SongEvent {
    fn new(pitch: &str, beats: f64) -> Self {
        SongEvent {
            pitch: pitch.to_string(),
            beats,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.pitch == REST
    }
}

/// A pre-authored song. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub name: String,
    pub tempo_bpm: f64,
    pub events: Vec<SongEvent>,
    /// Sound mode this song prefers; applied at play time when the
    /// auto-apply policy is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Song {
    /// Seconds per beat at this song's tempo.
    pub fn beat_seconds(&self) -> f64 {
        60.0 / self.tempo_bpm
    }

    pub fn total_beats(&self) -> f64 {
        self.events.iter().map(|e| e.beats).sum()
    }

    /// Full playback duration in seconds, rests included.
    pub fn duration_seconds(&self) -> f64 {
        self.total_beats() * self.beat_seconds()
    }

    /// Reject the song if any non-rest pitch fails to parse. Called by the
    /// scheduler before anything is scheduled, so a malformed song never
    /// half-plays.
    pub fn validate(&self) -> Result<(), SynthError> {
        for event in &self.events {
            if !event.is_rest() {
                pitch::frequency_of(&event.pitch)?;
            }
        }
        Ok(())
    }
}

/// The built-in song library, keyed by song id.
#[derive(Debug, Clone)]
pub struct SongLibrary {
    songs: HashMap<String, Song>,
}

impl SongLibrary {
    pub fn new() -> Self {
        let mut songs = HashMap::new();
        for song in builtin_songs() {
            songs.insert(song.id.clone(), song);
        }
        SongLibrary { songs }
    }

    pub fn get(&self, id: &str) -> Result<&Song, SynthError> {
        self.songs.get(id).ok_or_else(|| SynthError::UnknownSong {
            id: id.to_string(),
        })
    }

    /// All songs, sorted by id for stable listings.
    pub fn all(&self) -> Vec<&Song> {
        let mut songs: Vec<&Song> = self.songs.values().collect();
        songs.sort_by(|a, b| a.id.cmp(&b.id));
        songs
    }
}

impl Default for SongLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_songs() -> Vec<Song> {
    vec![
        Song {
            id: "game-theme".to_string(),
            name: "Platformer Theme".to_string(),
            tempo_bpm: 160.0,
            mode: Some("retro-game".to_string()),
            events: vec![
                // Main melody
                SongEvent::new("E4", 0.25),
                SongEvent::new("E4", 0.25),
                SongEvent::new(REST, 0.25),
                SongEvent::new("E4", 0.25),
                SongEvent::new(REST, 0.25),
                SongEvent::new("C4", 0.25),
                SongEvent::new("E4", 0.25),
                SongEvent::new(REST, 0.25),
                SongEvent::new("G4", 0.5),
                SongEvent::new(REST, 0.5),
                SongEvent::new("G3", 0.5),
                SongEvent::new(REST, 0.25),
                // Second phrase
                SongEvent::new("C4", 0.25),
                SongEvent::new(REST, 0.5),
                SongEvent::new("G3", 0.25),
                SongEvent::new(REST, 0.5),
                SongEvent::new("E3", 0.25),
                SongEvent::new(REST, 0.5),
                SongEvent::new("A3", 0.25),
                SongEvent::new(REST, 0.25),
                SongEvent::new("B3", 0.25),
                SongEvent::new(REST, 0.25),
                SongEvent::new("A#3", 0.25),
                SongEvent::new("A3", 0.25),
                // Third phrase
                SongEvent::new("G3", 0.25),
                SongEvent::new("E4", 0.25),
                SongEvent::new("G4", 0.25),
                SongEvent::new("A4", 0.25),
                SongEvent::new("F4", 0.25),
                SongEvent::new("G4", 0.25),
                SongEvent::new(REST, 0.25),
                SongEvent::new("E4", 0.25),
                SongEvent::new(REST, 0.25),
                SongEvent::new("C4", 0.25),
                SongEvent::new("D4", 0.25),
                SongEvent::new("B3", 0.25),
            ],
        },
        Song {
            id: "simple-scale".to_string(),
            name: "Simple Scale".to_string(),
            tempo_bpm: 120.0,
            mode: Some("soft-keys".to_string()),
            events: vec![
                SongEvent::new("C4", 0.5),
                SongEvent::new("D4", 0.5),
                SongEvent::new("E4", 0.5),
                SongEvent::new("F4", 0.5),
                SongEvent::new("G4", 0.5),
                SongEvent::new("A4", 0.5),
                SongEvent::new("B4", 0.5),
                SongEvent::new("C5", 0.5),
                SongEvent::new("B4", 0.5),
                SongEvent::new("A4", 0.5),
                SongEvent::new("G4", 0.5),
                SongEvent::new("F4", 0.5),
                SongEvent::new("E4", 0.5),
                SongEvent::new("D4", 0.5),
                SongEvent::new("C4", 0.5),
            ],
        },
    ]
}
