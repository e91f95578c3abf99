//! Single-pole lowpass.
//!
//! `y[n] = x[n]·(1 - a) + y[n-1]·a`
//!
//! `a` near 0 passes everything, `a` near 1 smooths heavily. In a waveguide
//! loop it models the energy each reflection loses at high frequencies.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy)]
pub struct OnePole {
    a: f32,
    z1: f32,
}

impl OnePole {
    /// Filter with feedback coefficient `a`, clamped to `[0, 0.9999]`.
    pub fn new(a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 0.9999),
            z1: 0.0,
        }
    }

    /// Coefficient for a -3 dB point near `cutoff_hz`.
    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let cutoff = cutoff_hz.clamp(1.0, sample_rate * 0.5);
        Self::new((-TAU * cutoff / sample_rate).exp())
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.z1 = x * (1.0 - self.a) + self.z1 * self.a;
        self.z1
    }

    pub fn set_coefficient(&mut self, a: f32) {
        self.a = a.clamp(0.0, 0.9999);
    }

    pub fn coefficient(&self) -> f32 {
        self.a
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_coefficient_averages() {
        let mut filter = OnePole::new(0.5);
        assert_eq!(filter.process(1.0), 0.5);
        assert_eq!(filter.process(1.0), 0.75);
    }

    #[test]
    fn settles_on_dc() {
        let mut filter = OnePole::lowpass(100.0, 48_000.0);
        let mut out = 0.0;
        for _ in 0..48_000 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-3, "DC should pass, got {out}");
    }

    #[test]
    fn attenuates_nyquist() {
        let mut filter = OnePole::lowpass(200.0, 48_000.0);
        let mut peak = 0.0f32;
        for i in 0..4_800 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = filter.process(x);
            if i > 1_000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.05, "alternating input should be smoothed, peak {peak}");
    }
}
