//! DSP — pure Rust synthesis primitives and the bundled software backend.
//!
//! The same code powers both the WebAudio path (via AudioWorklet + WASM) and
//! the offline WAV renderer, so output is deterministic across platforms.

pub mod delay;
pub mod oscillator;
pub mod ramp;
pub mod renderer;
pub mod reverb;
pub mod software;
