//! Low-frequency sine oscillator for control-rate modulation.
/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running below hearing (roughly 0.01 Hz to 20 Hz).
Its output is never heard directly; it moves a parameter of something else.

  period      Time for one oscillation. At 0.1 Hz: 10 seconds.
  bipolar     Output swings -1.0 to +1.0, so the target moves above AND
              below its base value.

The master bus "vibe" runs a 0.1 Hz sine into the echo feedback: one slow
breath every ten seconds, too slow to hear as wobble, fast enough that the
echo tail never sounds static.
*/

use std::f32::consts::TAU;

#[derive(Debug, Clone)]
pub struct Lfo {
    frequency: f32,
    phase: f32,
    sample_rate: f32,
}

impl Lfo {
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self {
            frequency: frequency.clamp(0.0, 20.0),
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.clamp(0.0, 20.0);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Bipolar sine output, then advance one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let out = (self.phase * TAU).sin();
        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_period_reaches_peak() {
        // 1 Hz at 1 kHz: peak after 250 samples
        let mut lfo = Lfo::new(1.0, 1_000.0);
        let mut buffer = [0.0; 251];
        lfo.render(&mut buffer);
        assert!((buffer[250] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn unipolar_conversion() {
        assert_eq!(bipolar_to_unipolar(-1.0), 0.0);
        assert_eq!(bipolar_to_unipolar(0.0), 0.5);
        assert_eq!(bipolar_to_unipolar(1.0), 1.0);
    }
}
