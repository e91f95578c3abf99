//! Waveshaping distortion.
//!
//! A waveshaper maps every sample through a fixed transfer curve. The curve
//! here is the classic "amount" shaper:
//!
//! ```text
//!            (3 + k) · x · 20°
//!   f(x) = ---------------------      k = amount (0..100)
//!              π + k · |x|
//! ```
//!
//! With `k = 0` it is a plain gain of 1/3. As `k` grows the knee sharpens and
//! the output approaches a hard clip.
//!
//! # Amount Values
//!
//!   0      = Clean (attenuated)
//!   10-30  = Warm saturation
//!   50-100 = Heavy, fuzzy

use std::f32::consts::PI;

const TWENTY_DEGREES: f32 = 20.0 * PI / 180.0;

/// Evaluate the shaping curve for one sample.
#[inline]
pub fn waveshape(x: f32, amount: f32) -> f32 {
    let k = amount.clamp(0.0, 100.0);
    let x = x.clamp(-1.0, 1.0);
    (3.0 + k) * x * TWENTY_DEGREES / (PI + k * x.abs())
}

/// Waveshaper with a dry/wet mix.
#[derive(Debug, Clone, Copy)]
pub struct Waveshaper {
    amount: f32,
    wet: f32,
}

impl Waveshaper {
    pub fn new(amount: f32, wet: f32) -> Self {
        Self {
            amount: amount.clamp(0.0, 100.0),
            wet: wet.clamp(0.0, 1.0),
        }
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 100.0);
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        if self.wet == 0.0 {
            return sample;
        }
        sample * (1.0 - self.wet) + waveshape(sample, self.amount) * self.wet
    }

    pub fn process_buffer(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}
