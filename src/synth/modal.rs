//! Modal resonator bank.
//!
//! Four decaying sinusoids ("modes") at fixed inharmonic ratios to the
//! fundamental. The ratios and decays give a marimba-like bar: a strong
//! fundamental, then three quickly dying overtones.
//!
//! | mode | ratio | decay/sample | gain on strike |
//! |------|-------|--------------|----------------|
//! | 0    | 1.0   | 0.998        | 1            |
//! | 1    | 3.99  | 0.995        | 1/2          |
//! | 2    | 9.2   | 0.992        | 1/3          |
//! | 3    | 13.5  | 0.990        | 1/4          |
//!
//! Any exciter sample with `|input| > 0.01` re-arms every gain, the way a
//! second strike re-energises a bar that is still ringing.

use std::f32::consts::TAU;

use crate::{dsp::Envelope, synth::voice::SynthVoice};

pub const MODE_COUNT: usize = 4;
pub const MODE_RATIOS: [f32; MODE_COUNT] = [1.0, 3.99, 9.2, 13.5];
pub const MODE_DECAYS: [f32; MODE_COUNT] = [0.998, 0.995, 0.992, 0.990];
const INITIAL_GAINS: [f32; MODE_COUNT] = [1.0, 0.5, 0.3, 0.2];
const OUTPUT_SCALE: f32 = 0.3;
const STRIKE_THRESHOLD: f32 = 0.01;
/// All modes below this and the bar is done.
const SILENCE: f32 = 1e-5;

pub struct ModalVoice {
    frequency: f32,
    phases: [f32; MODE_COUNT],
    gains: [f32; MODE_COUNT],
    strike_pending: bool,
    amp: Envelope,
    sample_rate: f32,
}

impl ModalVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frequency: 440.0,
            phases: [0.0; MODE_COUNT],
            gains: INITIAL_GAINS,
            strike_pending: false,
            amp: Envelope::new(1.0, sample_rate),
            sample_rate,
        }
    }

    /// Reset phases and queue a strike on the next sample.
    pub fn start(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.phases = [0.0; MODE_COUNT];
        self.gains = INITIAL_GAINS;
        self.strike_pending = true;
        self.amp = Envelope::new(1.0, self.sample_rate);
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Frequency of every mode in Hz.
    pub fn mode_frequencies(&self) -> [f32; MODE_COUNT] {
        MODE_RATIOS.map(|ratio| self.frequency * ratio)
    }

    pub fn gains(&self) -> [f32; MODE_COUNT] {
        self.gains
    }

    /// One sample of the bank driven by `input`.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if input.abs() > STRIKE_THRESHOLD {
            for (m, gain) in self.gains.iter_mut().enumerate() {
                *gain = 1.0 / (m as f32 + 1.0);
            }
        }

        let nyquist = self.sample_rate * 0.5;
        let mut out = 0.0;
        for m in 0..MODE_COUNT {
            let mode_freq = self.frequency * MODE_RATIOS[m];
            self.phases[m] = (self.phases[m] + TAU * mode_freq / self.sample_rate).rem_euclid(TAU);
            self.gains[m] *= MODE_DECAYS[m];
            // a mode above Nyquist would alias back down as a wrong partial
            if mode_freq < nyquist {
                out += self.phases[m].sin() * self.gains[m] * OUTPUT_SCALE;
            }
        }
        out
    }
}

impl SynthVoice for ModalVoice {
    type Shared = ();

    #[inline]
    fn next_sample(&mut self, _shared: &()) -> f32 {
        let strike = if self.strike_pending {
            self.strike_pending = false;
            1.0
        } else {
            0.0
        };
        self.process(strike) * self.amp.next_sample()
    }

    fn is_finished(&self) -> bool {
        let rung_out = !self.strike_pending && self.gains.iter().all(|g| *g < SILENCE);
        rung_out || (self.amp.is_finished() && self.amp.level() == 0.0)
    }

    fn release(&mut self, seconds: f32) {
        self.amp.release(seconds);
    }
}
