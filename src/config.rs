//! Immutable engine and scheduler configuration.
//!
//! Nothing in the crate reads a process-wide sample rate. Every engine, voice
//! and render pass is handed an [`EngineConfig`] at construction.

use std::time::Duration;

use crate::{error::EngineError, MAX_BLOCK_SIZE};

pub const MIN_SAMPLE_RATE: f32 = 8_000.0;
pub const MAX_SAMPLE_RATE: f32 = 192_000.0;

/// Sample rate and render block size shared by one engine instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    sample_rate: f32,
    block_size: usize,
}

impl EngineConfig {
    pub fn new(sample_rate: f32, block_size: usize) -> Result<Self, EngineError> {
        if !sample_rate.is_finite() || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate)
        {
            return Err(EngineError::InvalidSampleRate { sample_rate });
        }
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(EngineError::InvalidBlockSize {
                block_size,
                max: MAX_BLOCK_SIZE,
            });
        }
        Ok(Self {
            sample_rate,
            block_size,
        })
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Audio-clock seconds to the nearest frame. Negative times map to frame 0.
    #[inline]
    pub fn seconds_to_frames(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.sample_rate as f64).round() as u64
    }

    #[inline]
    pub fn frames_to_seconds(&self, frames: u64) -> f64 {
        frames as f64 / self.sample_rate as f64
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            block_size: 128,
        }
    }
}

/// How a step's `duration` (in step units) becomes seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationScale {
    /// Fixed seconds per step unit, independent of tempo.
    Seconds(f64),
    /// One step unit is one sixteenth note at the current tempo.
    Tempo,
}

impl DurationScale {
    pub fn seconds(&self, duration_steps: f64, tempo: f64) -> f64 {
        match *self {
            DurationScale::Seconds(per_step) => duration_steps * per_step,
            DurationScale::Tempo => duration_steps * sixteenth_seconds(tempo),
        }
    }
}

impl Default for DurationScale {
    fn default() -> Self {
        DurationScale::Seconds(0.2)
    }
}

/// Length of one sixteenth note in seconds.
#[inline]
pub fn sixteenth_seconds(tempo: f64) -> f64 {
    (60.0 / tempo) / 4.0
}

/// Timing constants for the lookahead scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// How often the control thread wakes up to schedule.
    pub lookahead: Duration,
    /// How far past "now" each tick dispatches events, in seconds.
    pub schedule_ahead: f64,
    /// Offset applied to the first event after `start`.
    pub start_delay: f64,
    pub duration_scale: DurationScale,
    /// Steps walked before the cursor wraps.
    pub steps_per_bar: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(25),
            schedule_ahead: 0.1,
            start_delay: 0.05,
            duration_scale: DurationScale::default(),
            steps_per_bar: 16,
        }
    }
}
