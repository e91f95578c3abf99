//! Synthetic drum kit: kick, snare and hihat.
//!
//! This branch bypasses the modal bank. Each hit is one oscillator under a
//! fast exponential envelope, with a noise layer for the snare and hats:
//!
//! ```text
//! note 36  kick   sine 150 Hz → 0.01 Hz over 0.5 s, gain 1.0 → 0.01
//! note 38  snare  triangle 200 Hz + noise,          gain 0.5 → 0.01 over 0.2 s
//! note 42  hihat  square 8 kHz + noise,             gain 0.3 → 0.01 over 0.05 s
//! ```
//!
//! Any other note has no drum and is ignored by the instrument.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    dsp::{Envelope, Oscillator, OscillatorWaveform},
    synth::voice::SynthVoice,
};

pub const KICK_NOTE: u8 = 36;
pub const SNARE_NOTE: u8 = 38;
pub const HIHAT_NOTE: u8 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumSound {
    Kick,
    Snare,
    HiHat,
}

impl DrumSound {
    pub fn from_note(note: u8) -> Option<Self> {
        match note {
            KICK_NOTE => Some(DrumSound::Kick),
            SNARE_NOTE => Some(DrumSound::Snare),
            HIHAT_NOTE => Some(DrumSound::HiHat),
            _ => None,
        }
    }

    /// Seconds until the hit is cut.
    pub fn length(self) -> f32 {
        match self {
            DrumSound::Kick => 0.5,
            DrumSound::Snare => 0.2,
            DrumSound::HiHat => 0.05,
        }
    }

    fn waveform(self) -> OscillatorWaveform {
        match self {
            DrumSound::Kick => OscillatorWaveform::Sine,
            DrumSound::Snare => OscillatorWaveform::Triangle,
            DrumSound::HiHat => OscillatorWaveform::Square,
        }
    }

    fn peak(self) -> f32 {
        match self {
            DrumSound::Kick => 1.0,
            DrumSound::Snare => 0.5,
            DrumSound::HiHat => 0.3,
        }
    }

    fn noise_mix(self) -> f32 {
        match self {
            DrumSound::Kick => 0.0,
            DrumSound::Snare => 0.6,
            DrumSound::HiHat => 0.5,
        }
    }
}

pub struct DrumVoice {
    osc: Oscillator,
    pitch: Envelope,
    amp: Envelope,
    noise_mix: f32,
    rng: SmallRng,
    sample_rate: f32,
}

impl DrumVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            osc: Oscillator::new(OscillatorWaveform::Sine, sample_rate),
            pitch: Envelope::new(0.0, sample_rate),
            amp: Envelope::new(0.0, sample_rate),
            noise_mix: 0.0,
            rng: SmallRng::seed_from_u64(0),
            sample_rate,
        }
    }

    pub fn start(&mut self, sound: DrumSound, seed: u64) {
        let sr = self.sample_rate;
        let length = sound.length();

        self.osc.reset(sound.waveform());
        self.pitch = match sound {
            DrumSound::Kick => Envelope::new(150.0, sr).exponential_to(0.01, length),
            DrumSound::Snare => Envelope::new(200.0, sr),
            DrumSound::HiHat => Envelope::new(8_000.0, sr),
        };
        self.amp = Envelope::new(sound.peak(), sr)
            .exponential_to(0.01, length)
            .set_at(0.0, length);
        self.noise_mix = sound.noise_mix();
        self.rng = SmallRng::seed_from_u64(seed);
    }
}

impl SynthVoice for DrumVoice {
    type Shared = ();

    #[inline]
    fn next_sample(&mut self, _shared: &()) -> f32 {
        let tone = self.osc.next_sample(self.pitch.next_sample());
        let sample = if self.noise_mix > 0.0 {
            let noise = self.rng.random::<f32>() * 2.0 - 1.0;
            tone * (1.0 - self.noise_mix) + noise * self.noise_mix
        } else {
            tone
        };
        sample * self.amp.next_sample()
    }

    fn is_finished(&self) -> bool {
        self.amp.is_finished() && self.amp.level() == 0.0
    }

    fn release(&mut self, seconds: f32) {
        self.amp.release(seconds);
    }
}
