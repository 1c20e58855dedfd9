//! The bundled pure-Rust tone backend.
//!
//! Implements [`ToneBackend`] with a sample clock: generators are
//! band-limited oscillators, envelopes are gain lines evaluated per sample,
//! and every envelope fans out to the master plus the delay and reverb
//! sends. The same code serves offline WAV rendering and AudioWorklet
//! playback via WASM.

use std::collections::HashMap;

use crate::backend::{Destination, EnvelopeId, GeneratorId, NodeRef, ToneBackend};
use crate::dsp::delay::DelayLine;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::ramp::GainLine;
use crate::dsp::reverb::Reverb;
use crate::error::SynthError;

// Fixed send-effect character, matching the original's 0.3 s echo.
const DELAY_TIME: f64 = 0.3;
const DELAY_FEEDBACK: f64 = 0.4;

#[derive(Debug)]
struct Generator {
    osc: Oscillator,
    envelope: Option<EnvelopeId>,
    start_at: Option<f64>,
    stop_at: Option<f64>,
}

#[derive(Debug)]
struct Envelope {
    gain: GainLine,
    to_master: bool,
    to_delay: bool,
    to_reverb: bool,
}

/// A software tone generator with its own sample clock.
#[derive(Debug)]
pub struct SoftwareBackend {
    sample_rate: f64,
    clock_samples: u64,
    next_id: u32,
    generators: HashMap<GeneratorId, Generator>,
    envelopes: HashMap<EnvelopeId, Envelope>,
    delay: DelayLine,
    reverb: Reverb,
    delay_level: f64,
    reverb_level: f64,
    master_gain: f64,
}

impl SoftwareBackend {
    pub fn new(sample_rate: f64, master_gain: f64) -> Self {
        SoftwareBackend {
            sample_rate,
            clock_samples: 0,
            next_id: 0,
            generators: HashMap::new(),
            envelopes: HashMap::new(),
            delay: DelayLine::new(sample_rate, DELAY_TIME, DELAY_FEEDBACK),
            reverb: Reverb::new(sample_rate),
            delay_level: 0.0,
            reverb_level: 0.0,
            master_gain,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn next_generator_id(&mut self) -> GeneratorId {
        let id = GeneratorId(self.next_id);
        self.next_id += 1;
        id
    }

    fn next_envelope_id(&mut self) -> EnvelopeId {
        let id = EnvelopeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Drop generators whose scheduled stop has passed, along with their
    /// envelopes.
    fn reap(&mut self, now: f64) {
        let dead: Vec<GeneratorId> = self
            .generators
            .iter()
            .filter(|(_, g)| g.stop_at.is_some_and(|t| t <= now))
            .map(|(&id, _)| id)
            .collect();
        for id in dead {
            if let Some(generator) = self.generators.remove(&id) {
                if let Some(env) = generator.envelope {
                    self.envelopes.remove(&env);
                }
            }
        }
    }
}

/// Soft clipper on the master output.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}

impl ToneBackend for SoftwareBackend {
    fn is_ready(&self) -> bool {
        true
    }

    fn ensure_ready(&mut self) -> Result<(), SynthError> {
        Ok(())
    }

    fn now(&self) -> f64 {
        self.clock_samples as f64 / self.sample_rate
    }

    fn create_generator(
        &mut self,
        waveform: Waveform,
        frequency: f64,
    ) -> Result<GeneratorId, SynthError> {
        let id = self.next_generator_id();
        self.generators.insert(
            id,
            Generator {
                osc: Oscillator::new(waveform, frequency),
                envelope: None,
                start_at: None,
                stop_at: None,
            },
        );
        Ok(id)
    }

    fn create_envelope(&mut self) -> EnvelopeId {
        let id = self.next_envelope_id();
        self.envelopes.insert(
            id,
            Envelope {
                gain: GainLine::new(0.0),
                to_master: false,
                to_delay: false,
                to_reverb: false,
            },
        );
        id
    }

    fn connect(&mut self, node: NodeRef, dest: Destination) {
        match (node, dest) {
            (NodeRef::Generator(id), Destination::Envelope(env)) => {
                if let Some(generator) = self.generators.get_mut(&id) {
                    generator.envelope = Some(env);
                }
            }
            (NodeRef::Envelope(id), dest) => {
                if let Some(envelope) = self.envelopes.get_mut(&id) {
                    match dest {
                        Destination::Master => envelope.to_master = true,
                        Destination::Delay => envelope.to_delay = true,
                        Destination::Reverb => envelope.to_reverb = true,
                        Destination::Envelope(_) => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, id: GeneratorId, at: f64) {
        if let Some(generator) = self.generators.get_mut(&id) {
            generator.start_at = Some(at);
        }
    }

    fn schedule_stop(&mut self, id: GeneratorId, at: f64) {
        if let Some(generator) = self.generators.get_mut(&id) {
            generator.stop_at = Some(at);
        }
    }

    fn stop_now(&mut self, id: GeneratorId) {
        if let Some(generator) = self.generators.remove(&id) {
            if let Some(env) = generator.envelope {
                self.envelopes.remove(&env);
            }
        }
    }

    fn set_waveform(&mut self, id: GeneratorId, waveform: Waveform) {
        if let Some(generator) = self.generators.get_mut(&id) {
            generator.osc.waveform = waveform;
        }
    }

    fn set_level_at(&mut self, env: EnvelopeId, level: f64, at: f64) {
        if let Some(envelope) = self.envelopes.get_mut(&env) {
            envelope.gain.set_value_at(level, at);
        }
    }

    fn ramp_to(&mut self, env: EnvelopeId, level: f64, at: f64) {
        if let Some(envelope) = self.envelopes.get_mut(&env) {
            envelope.gain.ramp_to(level, at);
        }
    }

    fn cancel_and_hold(&mut self, env: EnvelopeId, at: f64) {
        if let Some(envelope) = self.envelopes.get_mut(&env) {
            envelope.gain.cancel_and_hold_at(at);
        }
    }

    fn level_at(&self, env: EnvelopeId, at: f64) -> f64 {
        self.envelopes.get(&env).map_or(0.0, |e| e.gain.level_at(at))
    }

    fn set_bus_levels(&mut self, delay: f64, reverb: f64) {
        self.delay_level = delay.clamp(0.0, 1.0);
        self.reverb_level = reverb.clamp(0.0, 1.0);
    }

    fn set_master_gain(&mut self, gain: f64) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    fn clear_tails(&mut self) {
        self.delay.clear();
        self.reverb.clear();
    }

    fn render(&mut self, out: &mut [f32]) {
        let sample_rate = self.sample_rate;
        for sample in out.iter_mut() {
            let t = self.clock_samples as f64 / sample_rate;

            let mut master = 0.0f64;
            let mut delay_in = 0.0f64;
            let mut reverb_in = 0.0f64;

            for generator in self.generators.values_mut() {
                let running = generator.start_at.is_some_and(|s| s <= t)
                    && generator.stop_at.is_none_or(|s| t < s);
                if !running {
                    continue;
                }
                let Some(env_id) = generator.envelope else {
                    continue;
                };
                let Some(envelope) = self.envelopes.get(&env_id) else {
                    continue;
                };
                let voice = generator.osc.tick(sample_rate) * envelope.gain.level_at(t);
                if envelope.to_master {
                    master += voice;
                }
                if envelope.to_delay {
                    delay_in += voice;
                }
                if envelope.to_reverb {
                    reverb_in += voice;
                }
            }

            let wet_delay = self.delay.process(delay_in as f32) as f64;
            let wet_reverb = self.reverb.process(reverb_in as f32) as f64;
            let mixed =
                master + wet_delay * self.delay_level + wet_reverb * self.reverb_level;
            *sample = soft_clip(mixed * self.master_gain) as f32;

            self.clock_samples += 1;
        }
        self.reap(self.now());
    }
}
