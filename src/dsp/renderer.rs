//! WAV renderer — renders a library song to a WAV byte buffer offline.

use crate::config::SynthConfig;
use crate::dsp::software::SoftwareBackend;
use crate::engine::Engine;
use crate::error::SynthError;

const BLOCK_SIZE: usize = 128;

/// Extra render time after the song finishes so release, delay, and reverb
/// tails ring out instead of being cut at the last note.
const TAIL_SECONDS: f64 = 1.5;

/// Render a built-in song to a WAV file as bytes (16-bit stereo PCM).
pub fn render_song_wav(song_id: &str, sample_rate: u32) -> Result<Vec<u8>, SynthError> {
    let mono = render_song_samples(song_id, sample_rate)?;
    Ok(encode_wav(&mono, sample_rate))
}

/// Render a built-in song to mono f32 samples.
pub fn render_song_samples(song_id: &str, sample_rate: u32) -> Result<Vec<f32>, SynthError> {
    let config = SynthConfig {
        sample_rate: sample_rate as f64,
        ..Default::default()
    };
    let backend = SoftwareBackend::new(config.sample_rate, config.master_gain);
    let mut engine = Engine::new(backend, config);
    engine.play_song(song_id)?;

    let mut mono = Vec::new();
    let mut block = [0.0f32; BLOCK_SIZE];
    while engine.status().is_playing() {
        engine.process(&mut block);
        mono.extend_from_slice(&block);
    }
    let tail_blocks = (TAIL_SECONDS * sample_rate as f64 / BLOCK_SIZE as f64).ceil() as usize;
    for _ in 0..tail_blocks {
        engine.process(&mut block);
        mono.extend_from_slice(&block);
    }
    Ok(mono)
}

/// Encode mono f32 samples as a stereo 16-bit PCM WAV byte buffer. The mono
/// signal is duplicated into both channels.
fn encode_wav(mono: &[f32], sample_rate: u32) -> Vec<u8> {
    let channels: u16 = 2;
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (mono.len() * channels as usize * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in mono {
        let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        buf.extend_from_slice(&s.to_le_bytes());
        buf.extend_from_slice(&s.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_valid() {
        let wav = render_song_wav("simple-scale", 8000).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 8000);

        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 2);

        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(wav.len(), 44 + data_size as usize);
    }

    #[test]
    fn rendered_song_is_not_silence() {
        let wav = render_song_wav("simple-scale", 8000).unwrap();
        let has_nonzero = wav[44..]
            .chunks_exact(2)
            .any(|b| i16::from_le_bytes([b[0], b[1]]) != 0);
        assert!(has_nonzero, "rendered WAV should contain audio");
    }

    #[test]
    fn render_covers_song_plus_tail() {
        let samples = render_song_samples("simple-scale", 8000).unwrap();
        // simple-scale lasts 3.75 s; the render must reach past that plus
        // the tail, rounded up to whole blocks.
        let min = ((3.75 + TAIL_SECONDS) * 8000.0) as usize;
        assert!(samples.len() >= min);
    }

    #[test]
    fn unknown_song_is_an_error() {
        let err = render_song_wav("nope", 8000).unwrap_err();
        assert!(matches!(err, SynthError::UnknownSong { .. }));
    }
}
