//! Subtractive-style lead voice: one band-limited oscillator under a
//! pluck-shaped gain envelope.
//!
//! Gain rises linearly to 0.5 in 10 ms, then falls exponentially to 0.001 by
//! the end of the note. The voice keeps running for another 100 ms so the
//! exponential tail is never chopped.

use crate::{
    dsp::{Envelope, Oscillator, OscillatorWaveform},
    synth::voice::SynthVoice,
};

const ATTACK: f32 = 0.01;
const PEAK: f32 = 0.5;
const FLOOR: f32 = 0.001;
/// Extra run time after the note's duration.
pub const LEAD_TAIL: f32 = 0.1;

pub struct LeadVoice {
    osc: Oscillator,
    frequency: f32,
    amp: Envelope,
    sample_rate: f32,
}

impl LeadVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            osc: Oscillator::new(OscillatorWaveform::Sawtooth, sample_rate),
            frequency: 440.0,
            amp: Envelope::new(0.0, sample_rate),
            sample_rate,
        }
    }

    pub fn start(&mut self, waveform: OscillatorWaveform, frequency: f32, duration: f32) {
        self.osc.reset(waveform);
        self.frequency = frequency;
        self.amp = Envelope::new(0.0, self.sample_rate)
            .linear_to(PEAK, ATTACK)
            .exponential_to(FLOOR, duration.max(ATTACK))
            .set_at(0.0, duration.max(ATTACK) + LEAD_TAIL);
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }
}

impl SynthVoice for LeadVoice {
    type Shared = ();

    #[inline]
    fn next_sample(&mut self, _shared: &()) -> f32 {
        self.osc.next_sample(self.frequency) * self.amp.next_sample()
    }

    fn is_finished(&self) -> bool {
        self.amp.is_finished() && self.amp.level() == 0.0
    }

    fn release(&mut self, seconds: f32) {
        self.amp.release(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44_100.0;

    #[test]
    fn peaks_after_attack_then_decays() {
        let mut voice = LeadVoice::new(SAMPLE_RATE);
        voice.start(OscillatorWaveform::Square, 110.0, 0.4);

        let out: Vec<f32> = (0..(0.5 * SAMPLE_RATE) as usize)
            .map(|_| voice.next_sample(&()))
            .collect();
        let peak = |range: std::ops::Range<usize>| {
            out[range].iter().fold(0.0f32, |m, s| m.max(s.abs()))
        };

        assert!(peak(0..2_205) > 0.4, "attack should reach the peak");
        assert!(peak(15_000..17_640) < 0.01, "tail should be near the floor");
        assert!(out.iter().all(|s| s.abs() <= 0.6));
    }

    #[test]
    fn finishes_after_tail() {
        let mut voice = LeadVoice::new(SAMPLE_RATE);
        voice.start(OscillatorWaveform::Sawtooth, 440.0, 0.2);
        let mut samples = 0usize;
        while !voice.is_finished() {
            voice.next_sample(&());
            samples += 1;
        }
        let expected = ((0.2 + LEAD_TAIL) * SAMPLE_RATE).round() as usize;
        assert!(samples.abs_diff(expected) <= 1);
    }
}
