//! The audio clock: frames rendered so far, shared between the audio
//! callback (the only writer) and the control side.

use std::sync::atomic::{AtomicU64, Ordering};

/// Anything that can tell the control side what time the audio is at.
pub trait Clock: Send + Sync {
    /// Seconds since the clock started.
    fn now(&self) -> f64;
}

#[derive(Debug)]
pub struct AudioClock {
    frames: AtomicU64,
    sample_rate: f32,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: AtomicU64::new(0),
            sample_rate,
        }
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Called by the audio thread after each rendered block.
    #[inline]
    pub fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl Clock for AudioClock {
    fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}
