pub mod backend;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod mode;
pub mod pitch;
pub mod song;

use wasm_bindgen::prelude::*;

use crate::config::SynthConfig;
use crate::dsp::software::SoftwareBackend;
use crate::engine::Engine;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the macsynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: render a built-in song to a WAV byte array.
#[wasm_bindgen]
pub fn render_song_wav(song_id: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    dsp::renderer::render_song_wav(song_id, sample_rate).map_err(to_js)
}

/// WASM-exposed: render a built-in song to mono f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_song_samples(song_id: &str, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    dsp::renderer::render_song_samples(song_id, sample_rate).map_err(to_js)
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed interactive synth: the playback engine over the bundled
/// software backend, pulled block-by-block from an AudioWorklet.
#[wasm_bindgen]
pub struct Synth {
    engine: Engine<SoftwareBackend>,
}

impl Synth {
    fn with_config(config: SynthConfig) -> Synth {
        let config = config.sanitized();
        let backend = SoftwareBackend::new(config.sample_rate, config.master_gain);
        Synth {
            engine: Engine::new(backend, config),
        }
    }
}

#[wasm_bindgen]
impl Synth {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> Synth {
        let config = SynthConfig {
            sample_rate,
            ..Default::default()
        };
        Synth::with_config(config)
    }

    /// Build a synth from a config object; missing fields use defaults.
    pub fn from_config(config: JsValue) -> Result<Synth, JsValue> {
        let config: SynthConfig = serde_wasm_bindgen::from_value(config).map_err(to_js)?;
        Ok(Synth::with_config(config))
    }

    /// Start a note under the current sound mode. Returns whether a new
    /// voice started.
    pub fn trigger_note(&mut self, note: &str) -> Result<bool, JsValue> {
        self.engine.trigger_note(note).map_err(to_js)
    }

    pub fn release_note(&mut self, note: &str) {
        self.engine.release_note(note);
    }

    pub fn set_sound_mode(&mut self, name: &str) -> Result<(), JsValue> {
        self.engine.set_sound_mode(name).map_err(to_js)
    }

    pub fn set_effect_levels(&mut self, delay: f64, reverb: f64) {
        self.engine.set_effect_levels(delay, reverb);
    }

    pub fn set_master_gain(&mut self, gain: f64) {
        self.engine.set_master_gain(gain);
    }

    pub fn play_song(&mut self, song_id: &str) -> Result<(), JsValue> {
        self.engine.play_song(song_id).map_err(to_js)
    }

    pub fn stop_song(&mut self) {
        self.engine.stop_song();
    }

    /// Fill `out` with the next block of mono samples, firing any song
    /// actions that fall inside it.
    pub fn process(&mut self, out: &mut [f32]) {
        self.engine.process(out);
    }

    /// "idle" | "playing" | "finished" | "stopped".
    pub fn status(&self) -> String {
        self.engine.status().as_str().to_string()
    }

    pub fn progress(&self) -> f64 {
        self.engine.progress()
    }

    pub fn current_song(&self) -> Option<String> {
        self.engine.current_song().map(str::to_string)
    }

    pub fn current_mode(&self) -> String {
        self.engine.current_mode().name.clone()
    }

    /// All sound modes as a JS array, sorted by name.
    pub fn modes(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.modes()).map_err(to_js)
    }

    /// All built-in songs as a JS array, sorted by id.
    pub fn songs(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.songs()).map_err(to_js)
    }
}
