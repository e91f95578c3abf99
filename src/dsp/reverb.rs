//! Schroeder reverb for the master bus.
//!
//! ```text
//! in ──┬──→ [comb 29.7ms] ──┐
//!      ├──→ [comb 37.1ms] ──┤
//!      ├──→ [comb 41.1ms] ──┼──→ (+)/4 ──→ [allpass 5ms] ──→ [allpass 1.7ms] ──→ tail
//!      └──→ [comb 43.7ms] ──┘
//! ```
//!
//! Parallel combs build a dense train of decaying echoes; mutually prime
//! delay times keep them from piling up on one frequency. The series allpasses
//! smear the train into a diffuse tail without colouring it.
//!
//! All buffers are inline and sized for 192 kHz, so configuring the reverb for
//! a new sample rate never allocates.

const MAX_COMB_DELAY: usize = 9600; // 50 ms at 192 kHz
const MAX_ALLPASS_DELAY: usize = 1920; // 10 ms at 192 kHz

const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];
const ALLPASS_GAIN: f32 = 0.5;

fn ms_to_samples(ms: f32, sample_rate: f32, max: usize) -> usize {
    ((ms * sample_rate / 1000.0) as usize).clamp(1, max)
}

/// Feedback comb with a one-pole damper in the loop.
struct Comb {
    buffer: [f32; MAX_COMB_DELAY],
    len: usize,
    pos: usize,
    damp_state: f32,
}

impl Comb {
    fn new() -> Self {
        Self {
            buffer: [0.0; MAX_COMB_DELAY],
            len: 1,
            pos: 0,
            damp_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let out = self.buffer[self.pos];
        self.damp_state = out * (1.0 - damp) + self.damp_state * damp;
        self.buffer[self.pos] = input + self.damp_state * feedback;
        self.pos = (self.pos + 1) % self.len;
        out
    }
}

struct Allpass {
    buffer: [f32; MAX_ALLPASS_DELAY],
    len: usize,
    pos: usize,
}

impl Allpass {
    fn new() -> Self {
        Self {
            buffer: [0.0; MAX_ALLPASS_DELAY],
            len: 1,
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let out = -input * ALLPASS_GAIN + delayed;
        self.buffer[self.pos] = input + delayed * ALLPASS_GAIN;
        self.pos = (self.pos + 1) % self.len;
        out
    }
}

pub struct Reverb {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],
    feedback: f32,
    damp: f32,
    wet: f32,
}

impl Reverb {
    pub fn new(sample_rate: f32, wet: f32) -> Self {
        let mut reverb = Self {
            combs: [Comb::new(), Comb::new(), Comb::new(), Comb::new()],
            allpasses: [Allpass::new(), Allpass::new()],
            feedback: 0.84,
            damp: 0.2,
            wet: wet.clamp(0.0, 1.0),
        };
        reverb.configure(sample_rate);
        reverb
    }

    /// Retune delay lengths for `sample_rate` and clear the tail.
    pub fn configure(&mut self, sample_rate: f32) {
        for (comb, ms) in self.combs.iter_mut().zip(COMB_DELAYS_MS) {
            comb.len = ms_to_samples(ms, sample_rate, MAX_COMB_DELAY);
        }
        for (allpass, ms) in self.allpasses.iter_mut().zip(ALLPASS_DELAYS_MS) {
            allpass.len = ms_to_samples(ms, sample_rate, MAX_ALLPASS_DELAY);
        }
        self.reset();
    }

    /// Room size in `[0, 1]`, mapped to comb feedback 0.7..0.98.
    pub fn set_room_size(&mut self, size: f32) {
        self.feedback = 0.7 + size.clamp(0.0, 1.0) * 0.28;
    }

    /// High-frequency absorption in `[0, 1]`.
    pub fn set_damping(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    /// Dry input plus the wet tail.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut tail = 0.0;
        for comb in &mut self.combs {
            tail += comb.process(input, self.feedback, self.damp);
        }
        tail *= 0.25;
        for allpass in &mut self.allpasses {
            tail = allpass.process(tail);
        }
        input + tail * self.wet
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.buffer.fill(0.0);
            comb.pos = 0;
            comb.damp_state = 0.0;
        }
        for allpass in &mut self.allpasses {
            allpass.buffer.fill(0.0);
            allpass.pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_leaves_a_tail() {
        let mut reverb = Reverb::new(48_000.0, 1.0);
        reverb.process(1.0);

        // longest comb is ~43.7 ms = ~2100 samples at 48 kHz
        let has_tail = (0..5_000).any(|_| reverb.process(0.0).abs() > 0.001);
        assert!(has_tail, "reverb should ring after an impulse");
    }

    #[test]
    fn stays_stable_at_maximum_room() {
        let mut reverb = Reverb::new(48_000.0, 1.0);
        reverb.set_room_size(1.0);
        reverb.set_damping(0.0);
        for _ in 0..20_000 {
            let out = reverb.process(0.1);
            assert!(out.is_finite() && out.abs() < 10.0, "unstable output {out}");
        }
    }

    #[test]
    fn dry_reverb_is_transparent() {
        let mut reverb = Reverb::new(44_100.0, 0.0);
        for i in 0..1_000 {
            let x = (i as f32 * 0.01).sin();
            assert_eq!(reverb.process(x), x);
        }
    }
}
