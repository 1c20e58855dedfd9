//! Feedback delay line for the delay send.

/// A mono delay line with feedback.
///
/// Feedback is clamped below 1.0 so the loop stays bounded. The engine feeds
/// the voice sum in and mixes the wet output back to the master at the bus
/// send level.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    /// Feedback amount, always < 1.0.
    feedback: f32,
}

impl DelayLine {
    /// Create a delay line of `delay_seconds` at `sample_rate`.
    pub fn new(sample_rate: f64, delay_seconds: f64, feedback: f64) -> Self {
        let len = ((sample_rate * delay_seconds) as usize).max(1);
        DelayLine {
            buffer: vec![0.0; len],
            write_pos: 0,
            feedback: feedback.clamp(0.0, 0.95) as f32,
        }
    }

    /// Push one input sample and return the delayed (wet) output.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input + delayed * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        delayed
    }

    /// Silence the line; used by the hard-stop path so no echo tail
    /// bleeds into whatever plays next.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_reappears_after_delay_time() {
        // 10 ms at 1 kHz = 10 samples.
        let mut delay = DelayLine::new(1000.0, 0.01, 0.5);
        let first = delay.process(1.0);
        assert_eq!(first, 0.0);
        for _ in 0..9 {
            assert_eq!(delay.process(0.0), 0.0);
        }
        let echo = delay.process(0.0);
        assert!((echo - 1.0).abs() < 1e-6, "expected echo, got {echo}");
    }

    #[test]
    fn feedback_attenuates_each_pass() {
        let mut delay = DelayLine::new(1000.0, 0.01, 0.5);
        delay.process(1.0);
        for _ in 0..9 {
            delay.process(0.0);
        }
        let first_echo = delay.process(0.0);
        assert!((first_echo - 1.0).abs() < 1e-6);
        // Second echo comes around another 10 samples later at half level.
        for _ in 0..9 {
            delay.process(0.0);
        }
        let second = delay.process(0.0);
        assert!((second - 0.5).abs() < 1e-6, "expected 0.5, got {second}");
    }

    #[test]
    fn clear_silences_the_tail() {
        let mut delay = DelayLine::new(1000.0, 0.01, 0.9);
        delay.process(1.0);
        delay.clear();
        for _ in 0..50 {
            assert_eq!(delay.process(0.0), 0.0);
        }
    }

    #[test]
    fn feedback_is_clamped_below_one() {
        let mut delay = DelayLine::new(1000.0, 0.005, 2.0);
        delay.process(1.0);
        let mut max = 0.0f32;
        for _ in 0..10_000 {
            max = max.max(delay.process(0.0).abs());
        }
        assert!(max <= 1.0 + 1e-3, "runaway feedback, peak {max}");
    }
}
