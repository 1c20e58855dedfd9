use std::fmt;

/// Errors surfaced at the engine's API boundary.
///
/// Malformed note names and unknown identifiers are rejected here, never
/// silently substituted. `GeneratorUnavailable` is transient: the backend is
/// retried on the next user-triggered action.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthError {
    /// A note name that is neither the rest sentinel nor a valid
    /// pitch-class + octave token (e.g. "H4", "C#").
    InvalidNote { name: String },
    /// A sound-mode name not present in the registry.
    UnknownMode { name: String },
    /// A song id not present in the library.
    UnknownSong { id: String },
    /// The tone-generator backend is not ready to produce sound yet
    /// (e.g. the audio system has not been granted permission to run).
    GeneratorUnavailable,
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::InvalidNote { name } => write!(f, "Invalid note name '{name}'"),
            SynthError::UnknownMode { name } => write!(f, "Unknown sound mode '{name}'"),
            SynthError::UnknownSong { id } => write!(f, "Unknown song '{id}'"),
            SynthError::GeneratorUnavailable => write!(f, "Tone generator backend not ready"),
        }
    }
}

impl std::error::Error for SynthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_name() {
        let e = SynthError::InvalidNote {
            name: "H4".to_string(),
        };
        assert!(format!("{e}").contains("H4"));

        let e = SynthError::UnknownSong {
            id: "missing".to_string(),
        };
        assert!(format!("{e}").contains("missing"));
    }
}
