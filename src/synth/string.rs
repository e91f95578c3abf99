use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    dsp::{delay::DELAY_CAPACITY, DelayLine, Envelope, OnePole},
    synth::voice::SynthVoice,
};

/*
Karplus-Strong Plucked String
=============================

A string is modelled as a loop: a delay line one pitch period long, with a
lowpass and a gain slightly below one in the feedback path.

    excitation ──(+)──────────────────────────┬──→ out
                  ↑                           │
                  └── × decay ← [one-pole] ← [delay L] ←┘

Vocabulary
----------

  L           Loop length in samples, round(sample_rate / frequency).
              One trip around the loop is one period of the note.

  decay       Gain per trip (0 < decay < 1). Closer to 1 rings longer.

  excitation  What sets the string moving. A pluck is a burst of L samples
              of white noise: the loop filters it into a pitched tone within
              a few trips.


Per-Sample Update
-----------------

    delayed  = delay[read]                 (sample written L ticks ago)
    filtered = onepole(delayed, a = 0.5)
    next     = excitation + filtered × decay
    delay[write] = next
    output   = next

The a = 0.5 one-pole averages neighbouring samples. High harmonics lose more
energy per trip than low ones, which is why a plucked tone starts bright and
mellows as it decays.


Brightness
----------

The noise burst itself goes through a second one-pole before entering the
loop. Brightness 1.0 leaves it white; lower values darken the pluck the way a
thumb does compared to a pick.


Pitch Limits
------------

The delay line holds 2048 samples. At 44.1 kHz the lowest playable pitch is
44100 / 2047 ≈ 21.5 Hz; anything lower is clamped up to it.
*/

const LOOP_FILTER: f32 = 0.5;
const EXCITATION_LEVEL: f32 = 0.5;
/// Below this the string counts as silent.
const SILENCE: f32 = 1e-4;

/// Loop length for `frequency`, clamped to what the delay line can hold.
pub fn delay_length(sample_rate: f32, frequency: f32) -> usize {
    let samples = (sample_rate / frequency.max(f32::MIN_POSITIVE)).round();
    (samples as usize).clamp(2, DELAY_CAPACITY - 1)
}

pub struct StringVoice {
    delay: DelayLine,
    loop_filter: OnePole,
    burst_filter: OnePole,
    decay: f32,
    excitation_left: usize,
    quiet_samples: usize,
    amp: Envelope,
    rng: SmallRng,
    sample_rate: f32,
}

impl StringVoice {
    /// A silent, unexcited string.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            delay: DelayLine::new(),
            loop_filter: OnePole::new(LOOP_FILTER),
            burst_filter: OnePole::new(0.0),
            decay: 0.996,
            excitation_left: 0,
            quiet_samples: 0,
            amp: Envelope::new(1.0, sample_rate),
            rng: SmallRng::seed_from_u64(0),
            sample_rate,
        }
    }

    /// Reset the loop for a new note. The string stays silent until plucked.
    ///
    /// `fade_at` is when the voice's tail gets cut, in seconds from the start.
    pub fn start(&mut self, frequency: f32, decay: f32, fade_at: f32) {
        self.delay.reset();
        self.delay.set_delay(delay_length(self.sample_rate, frequency));
        self.loop_filter.reset();
        self.decay = decay.clamp(0.0, 0.9999);
        self.excitation_left = 0;
        self.quiet_samples = 0;
        self.amp = Envelope::new(1.0, self.sample_rate)
            .hold_until(fade_at - 0.05)
            .linear_to(0.0, fade_at);
    }

    /// Arm a noise burst one loop length long.
    pub fn pluck(&mut self, brightness: f32, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
        self.burst_filter = OnePole::new(1.0 - brightness.clamp(0.0, 1.0));
        self.excitation_left = self.delay.delay();
    }

    /// Retune at a block boundary. The loop content is kept.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.delay.set_delay(delay_length(self.sample_rate, frequency));
    }

    pub fn set_decay(&mut self, decay: f32) {
        self.decay = decay.clamp(0.0, 0.9999);
    }

    /// Loop length in samples.
    pub fn delay_length(&self) -> usize {
        self.delay.delay()
    }

    /// Run the loop with an external excitation sample.
    #[inline]
    pub fn process(&mut self, excitation: f32) -> f32 {
        let delayed = self.delay.read();
        let filtered = self.loop_filter.process(delayed);
        let next = excitation + filtered * self.decay;
        self.delay.write(next);

        if next.abs() < SILENCE {
            self.quiet_samples += 1;
        } else {
            self.quiet_samples = 0;
        }
        next
    }
}

impl SynthVoice for StringVoice {
    type Shared = ();

    #[inline]
    fn next_sample(&mut self, _shared: &()) -> f32 {
        let excitation = if self.excitation_left > 0 {
            self.excitation_left -= 1;
            let noise = self.rng.random::<f32>() * 2.0 - 1.0;
            self.burst_filter.process(noise) * EXCITATION_LEVEL
        } else {
            0.0
        };
        self.process(excitation) * self.amp.next_sample()
    }

    fn is_finished(&self) -> bool {
        let rung_out =
            self.excitation_left == 0 && self.quiet_samples > 2 * self.delay.delay();
        rung_out || (self.amp.is_finished() && self.amp.level() == 0.0)
    }

    fn release(&mut self, seconds: f32) {
        self.amp.release(seconds);
    }
}
