//! Pitch table — note-name to frequency conversion.
//!
//! Note names are a pitch class ("C" through "B", sharps only) followed by an
//! octave number, e.g. "C4", "A#3", "C5". The rest sentinel "R" maps to a
//! frequency of 0.0, which is never a playable value.

use crate::error::SynthError;

/// The rest sentinel: consumes time in a song but produces no sound.
pub const REST: &str = "R";

/// The twelve pitch classes, chromatic order starting at C. Sharps only —
/// flat spellings are rejected as invalid.
const CHROMATIC: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Index of A within [`CHROMATIC`]; A4 is the 440 Hz reference.
const A_INDEX: i32 = 9;

/// Convert a note name to a frequency in Hz.
///
/// Returns 0.0 for the rest sentinel. Fails with [`SynthError::InvalidNote`]
/// for an unrecognized pitch class, a missing/non-numeric octave, or an
/// octave outside 0..=9; callers must treat that as a rejected input, not
/// substitute a default.
pub fn frequency_of(note: &str) -> Result<f64, SynthError> {
    if note == REST {
        return Ok(0.0);
    }

    let digits_at = note
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| invalid(note))?;
    let (class, octave_str) = note.split_at(digits_at);

    let octave: i32 = octave_str.parse().map_err(|_| invalid(note))?;
    if !(0..=9).contains(&octave) {
        return Err(invalid(note));
    }
    let index = CHROMATIC
        .iter()
        .position(|&c| c == class)
        .ok_or_else(|| invalid(note))? as i32;

    // Semitone distance from A4, then 440 * 2^(distance/12).
    let distance = (octave - 4) * 12 + (index - A_INDEX);
    Ok(440.0 * (2.0_f64).powf(distance as f64 / 12.0))
}

fn invalid(note: &str) -> SynthError {
    SynthError::InvalidNote {
        name: note.to_string(),
    }
}
