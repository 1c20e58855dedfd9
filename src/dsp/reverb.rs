//! Small Schroeder-style reverb for the reverb send.
//!
//! Four parallel comb filters into two series allpasses — enough to give a
//! decaying diffuse tail. This is an illustrative effect, not a production
//! reverb.

/// A comb filter with damped feedback.
#[derive(Debug, Clone)]
struct Comb {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl Comb {
    fn new(size: usize, feedback: f32, damp: f32) -> Self {
        Comb {
            buffer: vec![0.0; size],
            index: 0,
            feedback,
            damp,
            filter_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = self.buffer[self.index];
        // One-pole lowpass in the feedback path darkens the tail.
        self.filter_state = out * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.index] = input + self.filter_state * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        out
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
    }
}

/// An allpass diffuser.
#[derive(Debug, Clone)]
struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    const FEEDBACK: f32 = 0.5;

    fn new(size: usize) -> Self {
        Allpass {
            buffer: vec![0.0; size],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * Self::FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        buffered - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// Delay lengths in samples at 44.1 kHz, scaled for other rates.
const COMB_TUNING: [usize; 4] = [1116, 1277, 1422, 1617];
const ALLPASS_TUNING: [usize; 2] = [556, 341];
const COMB_FEEDBACK: f32 = 0.82;
const COMB_DAMP: f32 = 0.25;
const INPUT_GAIN: f32 = 0.03;

/// The reverb unit: feed the voice sum in, mix the wet output back at the
/// bus send level.
#[derive(Debug, Clone)]
pub struct Reverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl Reverb {
    pub fn new(sample_rate: f64) -> Self {
        let scale = sample_rate / 44100.0;
        let combs = COMB_TUNING
            .iter()
            .map(|&t| Comb::new(((t as f64 * scale) as usize).max(1), COMB_FEEDBACK, COMB_DAMP))
            .collect();
        let allpasses = ALLPASS_TUNING
            .iter()
            .map(|&t| Allpass::new(((t as f64 * scale) as usize).max(1)))
            .collect();
        Reverb { combs, allpasses }
    }

    /// Push one input sample and return the wet output.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let scaled = input * INPUT_GAIN;
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(scaled);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }

    /// Silence all internal lines; used by the hard-stop path.
    pub fn clear(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for allpass in &mut self.allpasses {
            allpass.clear();
        }
    }
}
