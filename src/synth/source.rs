//! Source material for the granular cloud.
//!
//! A source buffer is mono, immutable once built and shared by reference
//! count, so the control thread can hand the same material to a realtime
//! engine and to an offline render.

use std::{f32::consts::TAU, sync::Arc};

use crate::error::EngineError;

/// Length of the built-in drone texture.
pub const DRONE_SECONDS: f32 = 2.0;

const DRONE_PARTIALS: [(f32, f32); 4] = [(220.0, 0.5), (330.0, 0.3), (440.0, 0.2), (554.37, 0.1)];
const DRONE_WOBBLE_HZ: f32 = 5.0;
const DRONE_WOBBLE_DEPTH: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct SourceBuffer {
    samples: Arc<[f32]>,
}

impl SourceBuffer {
    /// Wrap decoded mono samples.
    pub fn from_samples(samples: Vec<f32>) -> Result<Self, EngineError> {
        if samples.is_empty() {
            return Err(EngineError::EmptySourceBuffer);
        }
        Ok(Self {
            samples: samples.into(),
        })
    }

    /// Two seconds of a slowly fading A-major drone with a 5 Hz shimmer.
    pub fn harmonic_drone(sample_rate: f32) -> Self {
        let len = (DRONE_SECONDS * sample_rate) as usize;
        let samples: Vec<f32> = (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate;
                let tone: f32 = DRONE_PARTIALS
                    .iter()
                    .map(|(freq, level)| (TAU * freq * t).sin() * level)
                    .sum();
                let wobble = 1.0 + DRONE_WOBBLE_DEPTH * (TAU * DRONE_WOBBLE_HZ * t).sin();
                tone * wobble * (-t / 2.0).exp()
            })
            .collect();
        Self {
            samples: samples.into(),
        }
    }

    /// Resample `samples` from `from_rate` to `to_rate` with linear
    /// interpolation, for sources decoded at a different rate than the engine.
    pub fn resampled(samples: &[f32], from_rate: f32, to_rate: f32) -> Result<Self, EngineError> {
        if samples.is_empty() {
            return Err(EngineError::EmptySourceBuffer);
        }
        if (from_rate - to_rate).abs() < f32::EPSILON || from_rate <= 0.0 || to_rate <= 0.0 {
            return Self::from_samples(samples.to_vec());
        }

        let ratio = from_rate as f64 / to_rate as f64;
        let out_len = ((samples.len() as f64) / ratio).floor().max(1.0) as usize;
        let last = samples.len() - 1;
        let out = (0..out_len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let idx = (pos as usize).min(last);
                let frac = (pos - idx as f64) as f32;
                let a = samples[idx];
                let b = samples[(idx + 1).min(last)];
                a + (b - a) * frac
            })
            .collect();
        Self::from_samples(out)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Another reference to the same samples, without copying them.
    pub fn shared(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
