//! The tone-generator collaborator interface.
//!
//! The engine never touches synthesis primitives directly: it asks a
//! [`ToneBackend`] for generators and envelopes, wires them to destinations,
//! and schedules gain ramps against the backend's clock. The bundled
//! [`crate::dsp::software::SoftwareBackend`] implements this in pure Rust;
//! a host embedding the engine in a native audio graph can supply its own.

use crate::dsp::oscillator::Waveform;
use crate::error::SynthError;

/// Opaque handle to one oscillator owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorId(pub u32);

/// Opaque handle to one gain envelope owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvelopeId(pub u32);

/// A connectable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Generator(GeneratorId),
    Envelope(EnvelopeId),
}

/// Where a node's output goes. A voice wires generator → envelope, then the
/// envelope fans out to the master plus the two effect sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Envelope(EnvelopeId),
    Master,
    Delay,
    Reverb,
}

/// The capability the engine consumes. All times are absolute seconds on the
/// backend's own clock.
pub trait ToneBackend {
    /// Whether the backend can currently produce sound.
    fn is_ready(&self) -> bool;

    /// Try to bring the backend up; called lazily on every user-triggered
    /// action so a backend that was not yet permitted to run is retried
    /// rather than treated as fatal.
    fn ensure_ready(&mut self) -> Result<(), SynthError>;

    /// The backend clock in seconds.
    fn now(&self) -> f64;

    fn create_generator(
        &mut self,
        waveform: Waveform,
        frequency: f64,
    ) -> Result<GeneratorId, SynthError>;

    fn create_envelope(&mut self) -> EnvelopeId;

    fn connect(&mut self, node: NodeRef, dest: Destination);

    fn start(&mut self, id: GeneratorId, at: f64);

    /// Stop the generator once `at` is reached; the release tail keeps
    /// sounding until then.
    fn schedule_stop(&mut self, id: GeneratorId, at: f64);

    /// Stop the generator immediately, bypassing any pending release.
    fn stop_now(&mut self, id: GeneratorId);

    /// Change the generator's waveform without touching its envelope.
    fn set_waveform(&mut self, id: GeneratorId, waveform: Waveform);

    /// Pin the envelope to `level` at `at`, dropping later automation.
    fn set_level_at(&mut self, env: EnvelopeId, level: f64, at: f64);

    /// Ramp the envelope linearly to `level`, arriving at `at`.
    fn ramp_to(&mut self, env: EnvelopeId, level: f64, at: f64);

    /// Freeze the envelope at its value as of `at`.
    fn cancel_and_hold(&mut self, env: EnvelopeId, at: f64);

    /// The envelope's value at `at`.
    fn level_at(&self, env: EnvelopeId, at: f64) -> f64;

    /// Set the delay and reverb send levels shared by all voices.
    fn set_bus_levels(&mut self, delay: f64, reverb: f64);

    fn set_master_gain(&mut self, gain: f64);

    /// Flush effect tails; part of the hard-stop path.
    fn clear_tails(&mut self);

    /// Pull-model rendering: fill `out` with mono samples and advance the
    /// backend clock. Externally-driven backends leave this as silence.
    fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
    }
}

#[cfg(test)]
pub mod mock {
    //! A recording backend for engine-level tests: every call is logged and
    //! envelope automation is tracked with real gain lines so level
    //! continuity can be asserted.

    use std::collections::HashMap;

    use super::*;
    use crate::dsp::ramp::GainLine;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        CreateGenerator(Waveform, f64),
        CreateEnvelope,
        Connect(NodeRef, Destination),
        Start(GeneratorId, f64),
        ScheduleStop(GeneratorId, f64),
        StopNow(GeneratorId),
        SetWaveform(GeneratorId, Waveform),
        SetLevelAt(EnvelopeId, f64, f64),
        RampTo(EnvelopeId, f64, f64),
        CancelAndHold(EnvelopeId, f64),
        SetBusLevels(f64, f64),
        SetMasterGain(f64),
        ClearTails,
    }

    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        pub calls: Vec<Call>,
        pub ready: bool,
        pub clock: f64,
        next_id: u32,
        pub waveforms: HashMap<GeneratorId, Waveform>,
        pub envelopes: HashMap<EnvelopeId, GainLine>,
        pub running: Vec<GeneratorId>,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            RecordingBackend {
                ready: true,
                ..Default::default()
            }
        }

        /// Generators that have been started and not yet stopped.
        pub fn running_count(&self) -> usize {
            self.running.len()
        }

        pub fn calls_of<F: Fn(&Call) -> bool>(&self, pred: F) -> Vec<&Call> {
            self.calls.iter().filter(|c| pred(c)).collect()
        }
    }

    impl ToneBackend for RecordingBackend {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn ensure_ready(&mut self) -> Result<(), SynthError> {
            if self.ready {
                Ok(())
            } else {
                Err(SynthError::GeneratorUnavailable)
            }
        }

        fn now(&self) -> f64 {
            self.clock
        }

        fn create_generator(
            &mut self,
            waveform: Waveform,
            frequency: f64,
        ) -> Result<GeneratorId, SynthError> {
            if !self.ready {
                return Err(SynthError::GeneratorUnavailable);
            }
            self.calls.push(Call::CreateGenerator(waveform, frequency));
            let id = GeneratorId(self.next_id);
            self.next_id += 1;
            self.waveforms.insert(id, waveform);
            Ok(id)
        }

        fn create_envelope(&mut self) -> EnvelopeId {
            self.calls.push(Call::CreateEnvelope);
            let id = EnvelopeId(self.next_id);
            self.next_id += 1;
            self.envelopes.insert(id, GainLine::new(0.0));
            id
        }

        fn connect(&mut self, node: NodeRef, dest: Destination) {
            self.calls.push(Call::Connect(node, dest));
        }

        fn start(&mut self, id: GeneratorId, at: f64) {
            self.calls.push(Call::Start(id, at));
            self.running.push(id);
        }

        fn schedule_stop(&mut self, id: GeneratorId, at: f64) {
            self.calls.push(Call::ScheduleStop(id, at));
            self.running.retain(|&g| g != id);
        }

        fn stop_now(&mut self, id: GeneratorId) {
            self.calls.push(Call::StopNow(id));
            self.running.retain(|&g| g != id);
        }

        fn set_waveform(&mut self, id: GeneratorId, waveform: Waveform) {
            self.calls.push(Call::SetWaveform(id, waveform));
            self.waveforms.insert(id, waveform);
        }

        fn set_level_at(&mut self, env: EnvelopeId, level: f64, at: f64) {
            self.calls.push(Call::SetLevelAt(env, level, at));
            if let Some(line) = self.envelopes.get_mut(&env) {
                line.set_value_at(level, at);
            }
        }

        fn ramp_to(&mut self, env: EnvelopeId, level: f64, at: f64) {
            self.calls.push(Call::RampTo(env, level, at));
            if let Some(line) = self.envelopes.get_mut(&env) {
                line.ramp_to(level, at);
            }
        }

        fn cancel_and_hold(&mut self, env: EnvelopeId, at: f64) {
            self.calls.push(Call::CancelAndHold(env, at));
            if let Some(line) = self.envelopes.get_mut(&env) {
                line.cancel_and_hold_at(at);
            }
        }

        fn level_at(&self, env: EnvelopeId, at: f64) -> f64 {
            self.envelopes.get(&env).map_or(0.0, |l| l.level_at(at))
        }

        fn set_bus_levels(&mut self, delay: f64, reverb: f64) {
            self.calls.push(Call::SetBusLevels(delay, reverb));
        }

        fn set_master_gain(&mut self, gain: f64) {
            self.calls.push(Call::SetMasterGain(gain));
        }

        fn clear_tails(&mut self) {
            self.calls.push(Call::ClearTails);
        }
    }
}
