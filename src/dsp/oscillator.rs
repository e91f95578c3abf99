//! Phase-accumulator oscillators.
//!
//! Phase is kept in cycles (`0.0..1.0`) and the frequency is supplied per
//! sample, so a pitch envelope can sweep it without retriggering. Sawtooth and
//! square use PolyBLEP correction at their discontinuities to keep aliasing
//! down at high notes.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Sawtooth,
    Square,
    Triangle,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: OscillatorWaveform,
    phase: f32,
    sample_rate: f32,
}

impl Oscillator {
    pub fn new(waveform: OscillatorWaveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Switch waveform and restart at phase zero.
    pub fn reset(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
        self.phase = 0.0;
    }

    #[inline]
    pub fn next_sample(&mut self, frequency: f32) -> f32 {
        let dt = (frequency / self.sample_rate).clamp(0.0, 0.5);
        let p = self.phase;

        let sample = match self.waveform {
            OscillatorWaveform::Sine => (p * TAU).sin(),
            OscillatorWaveform::Sawtooth => 2.0 * p - 1.0 - poly_blep(p, dt),
            OscillatorWaveform::Square => {
                let naive = if p < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(p, dt) - poly_blep((p + 0.5) % 1.0, dt)
            }
            OscillatorWaveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Fill `buffer` at a fixed frequency.
    pub fn render(&mut self, buffer: &mut [f32], frequency: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(frequency);
        }
    }
}

/// Polynomial band-limited step residual for a discontinuity at phase 0.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn render(waveform: OscillatorWaveform, frequency: f32, samples: usize) -> Vec<f32> {
        let mut osc = Oscillator::new(waveform, SAMPLE_RATE);
        let mut buffer = vec![0.0; samples];
        osc.render(&mut buffer, frequency);
        buffer
    }

    #[test]
    fn waveforms_stay_in_range() {
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Sawtooth,
            OscillatorWaveform::Square,
            OscillatorWaveform::Triangle,
        ] {
            let buffer = render(waveform, 440.0, 4_800);
            assert!(
                buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.1),
                "{waveform:?} left the expected range"
            );
        }
    }

    #[test]
    fn sine_completes_one_cycle_per_period() {
        // 480 Hz at 48 kHz: exactly 100 samples per cycle
        let buffer = render(OscillatorWaveform::Sine, 480.0, 101);
        assert!(buffer[0].abs() < 1e-6);
        assert!((buffer[25] - 1.0).abs() < 1e-3);
        assert!(buffer[100].abs() < 1e-3);
    }

    #[test]
    fn triangle_starts_at_zero_and_peaks_at_quarter() {
        let buffer = render(OscillatorWaveform::Triangle, 480.0, 76);
        assert!(buffer[0].abs() < 1e-6);
        assert!((buffer[25] - 1.0).abs() < 1e-3);
        assert!((buffer[75] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn square_has_no_dc_offset() {
        let buffer = render(OscillatorWaveform::Square, 480.0, 4_800);
        let mean = buffer.iter().sum::<f32>() / buffer.len() as f32;
        assert!(mean.abs() < 0.01, "mean was {mean}");
    }
}
