use crate::{
    dsp::{delay::DELAY_CAPACITY, DelayLine, Envelope, OnePole},
    synth::voice::SynthVoice,
};

/*
Single-Reed Waveguide
=====================

A clarinet is a cylindrical bore closed at the mouthpiece by a reed and open
at the bell. Pressure waves travel down the bore, reflect at the bell with
inverted sign and come back to push on the reed.

    breath ──→ [reed] ──(+)──→ [bore delay L] ──┬──→ out (bell)
                 ↑       ↑                      │
                 │       └────── reflected ←────┤
                 └─── deltaP ← reflected ← -[one-pole] ←┘

Vocabulary
----------

  L           Round trip of the bore in samples: round(sr / (2·frequency)).
              Sign inversion at the bell doubles the period, so the loop
              sounds at `frequency` with mostly odd harmonics.

  reflected   What the bell sends back: the bore output lowpassed (open
              ends radiate highs and reflect lows) and inverted.

  deltaP      Pressure difference across the reed:
                  deltaP = breath - reflected

  reed table  Flow through the reed as a function of deltaP. Clamped to
              [-1, 1], then

                  flow = 0.8 · (x - 0.5·x³)

              A saturating odd curve: gentle pressure opens the reed
              proportionally, hard pressure slams it shut.


Per-Sample Update
-----------------

    boreOut   = delay[read]
    reflected = -onepole(boreOut)
    deltaP    = pressure - reflected
    boreIn    = reedTable(deltaP) + reflected
    delay[write] = boreIn
    output    = boreOut × envelope

The output is taken before the new excitation re-enters: sound radiates
from the bell. A DC blocker follows, since a blown reed also passes a steady
flow that would otherwise sit on the output as an offset.


Playable Pressure
-----------------

The loop only self-oscillates in a window of breath pressure, roughly 0.65
to 0.8. Below it the reed settles to a static flow: blowing without sounding.
Well above it the reed is held shut and the bore goes quiet again. 0.75 sits
in the middle of the window across the whole keyboard.
*/

const REED_SLOPE: f32 = 0.8;
/// Pole of the output DC blocker.
const DC_POLE: f32 = 0.995;
/// Breath ramps in and out this fast, in seconds.
const BREATH_RAMP: f32 = 0.01;

/// Flow through the reed for a pressure difference.
#[inline]
pub fn reed_table(delta_p: f32) -> f32 {
    let x = delta_p.clamp(-1.0, 1.0);
    REED_SLOPE * (x - 0.5 * x * x * x)
}

/// Bore round trip for `frequency`, clamped to what the delay line can hold.
pub fn bore_length(sample_rate: f32, frequency: f32) -> usize {
    let samples = (sample_rate / (2.0 * frequency.max(f32::MIN_POSITIVE))).round();
    (samples as usize).clamp(2, DELAY_CAPACITY - 1)
}

pub struct ReedVoice {
    bore: DelayLine,
    reflection: OnePole,
    pressure: f32,
    breath: Envelope,
    amp: Envelope,
    dc_x1: f32,
    dc_y1: f32,
    sample_rate: f32,
}

impl ReedVoice {
    /// A bore with no breath: outputs silence.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            bore: DelayLine::new(),
            reflection: OnePole::new(0.2),
            pressure: 0.0,
            breath: Envelope::new(0.0, sample_rate),
            amp: Envelope::new(1.0, sample_rate),
            dc_x1: 0.0,
            dc_y1: 0.0,
            sample_rate,
        }
    }

    /// Start a note. `amp` is the preset's amplitude envelope.
    pub fn start(
        &mut self,
        frequency: f32,
        pressure: f32,
        reflection: f32,
        duration: f32,
        amp: Envelope,
    ) {
        self.bore.reset();
        self.bore.set_delay(bore_length(self.sample_rate, frequency));
        self.reflection = OnePole::new(reflection);
        self.pressure = pressure.max(0.0);
        self.breath = Envelope::new(0.0, self.sample_rate)
            .linear_to(1.0, BREATH_RAMP)
            .hold_until(duration)
            .linear_to(0.0, duration + BREATH_RAMP);
        self.amp = amp;
        self.dc_x1 = 0.0;
        self.dc_y1 = 0.0;
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.bore.set_delay(bore_length(self.sample_rate, frequency));
    }

    /// Breath pressure target, applied from the next sample.
    pub fn set_pressure(&mut self, pressure: f32) {
        self.pressure = pressure.max(0.0);
    }

    pub fn bore_length(&self) -> usize {
        self.bore.delay()
    }

    /// One tick of the waveguide at an explicit breath pressure.
    #[inline]
    pub fn process(&mut self, pressure: f32) -> f32 {
        let bore_out = self.bore.read();
        let reflected = -self.reflection.process(bore_out);
        let delta_p = pressure - reflected;
        let bore_in = reed_table(delta_p) + reflected;
        self.bore.write(bore_in);
        bore_out
    }
}

impl SynthVoice for ReedVoice {
    type Shared = ();

    #[inline]
    fn next_sample(&mut self, _shared: &()) -> f32 {
        let pressure = self.breath.next_sample() * self.pressure;
        let bell = self.process(pressure);
        let blocked = bell - self.dc_x1 + DC_POLE * self.dc_y1;
        self.dc_x1 = bell;
        self.dc_y1 = blocked;
        blocked * self.amp.next_sample()
    }

    fn is_finished(&self) -> bool {
        self.amp.is_finished() && self.amp.level() == 0.0
    }

    fn release(&mut self, seconds: f32) {
        self.amp.release(seconds);
        self.breath.release(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44_100.0;

    fn flat_envelope(duration: f32) -> Envelope {
        Envelope::new(1.0, SAMPLE_RATE).set_at(0.0, duration)
    }

    #[test]
    fn reed_table_saturates() {
        assert_eq!(reed_table(0.0), 0.0);
        assert!((reed_table(1.0) - 0.4).abs() < 1e-6);
        assert_eq!(reed_table(5.0), reed_table(1.0), "input is clamped");
        assert_eq!(reed_table(-0.5), -reed_table(0.5));
    }

    #[test]
    fn bore_is_half_the_period() {
        let mut voice = ReedVoice::new(SAMPLE_RATE);
        voice.start(440.0, 0.75, 0.2, 1.0, flat_envelope(1.0));
        assert_eq!(voice.bore_length(), (SAMPLE_RATE / 880.0).round() as usize);
    }

    #[test]
    fn silent_without_breath() {
        let mut voice = ReedVoice::new(SAMPLE_RATE);
        voice.start(440.0, 0.0, 0.2, 1.0, flat_envelope(1.0));
        let out: Vec<f32> = (0..4_410).map(|_| voice.next_sample(&())).collect();
        assert!(out.iter().all(|s| *s == 0.0), "no breath, no sound");
    }

    #[test]
    fn strong_breath_sounds_and_stays_bounded() {
        let mut voice = ReedVoice::new(SAMPLE_RATE);
        voice.start(220.0, 0.75, 0.2, 1.0, flat_envelope(1.0));
        let out: Vec<f32> = (0..22_050).map(|_| voice.next_sample(&())).collect();

        assert!(out.iter().all(|s| s.is_finite() && s.abs() <= 2.0));
        let tail = &out[11_025..];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        let energy: f32 = tail.iter().map(|s| (s - mean) * (s - mean)).sum();
        assert!(mean.abs() < 0.05, "DC should be blocked, mean {mean}");
        assert!(energy > 100.0, "blown reed should keep sounding, energy {energy}");
    }

    #[test]
    fn release_silences_the_voice() {
        let mut voice = ReedVoice::new(SAMPLE_RATE);
        voice.start(220.0, 0.75, 0.2, 5.0, flat_envelope(5.0));
        for _ in 0..4_410 {
            voice.next_sample(&());
        }
        voice.release(0.005);
        for _ in 0..300 {
            voice.next_sample(&());
        }
        assert!(voice.is_finished());
    }
}
