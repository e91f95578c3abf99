//! Feedback echo with a lowpass in the loop.
//!
//! ```text
//! in ──(+)──────────────[ delay ]──┬──→ wet
//!       ↑                          │
//!       └── feedback ← [lowpass] ←─┘
//! ```
//!
//! Each repeat passes through the lowpass once more, so later echoes get
//! darker as well as quieter. The buffer is sized once for the longest delay
//! time, so changing the time at runtime never allocates.

use crate::dsp::{modulate::Modulatable, one_pole::OnePole};

pub const MAX_ECHO_SECONDS: f32 = 2.0;
pub const MAX_FEEDBACK: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoParam {
    /// Delay time in seconds.
    Time,
    Feedback,
    Wet,
}

pub struct Echo {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    time: f32,
    feedback: f32,
    wet: f32,
    tone: OnePole,
    sample_rate: f32,
}

impl Echo {
    pub fn new(sample_rate: f32, time: f32, feedback: f32, cutoff_hz: f32, wet: f32) -> Self {
        let capacity = (MAX_ECHO_SECONDS * sample_rate).ceil() as usize + 1;
        let mut echo = Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            delay_samples: 1,
            time: 0.0,
            feedback: 0.0,
            wet: 0.0,
            tone: OnePole::lowpass(cutoff_hz, sample_rate),
            sample_rate,
        };
        echo.set_param(EchoParam::Time, time);
        echo.set_param(EchoParam::Feedback, feedback);
        echo.set_param(EchoParam::Wet, wet);
        echo
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let len = self.buffer.len();
        let read_pos = (self.write_pos + len - self.delay_samples) % len;
        let delayed = self.buffer[read_pos];

        let damped = self.tone.process(delayed);
        self.buffer[self.write_pos] = input + damped * self.feedback;
        self.write_pos = (self.write_pos + 1) % len;

        input + delayed * self.wet
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.tone.reset();
    }
}

impl Modulatable for Echo {
    type Param = EchoParam;

    fn get_param(&self, param: EchoParam) -> f32 {
        match param {
            EchoParam::Time => self.time,
            EchoParam::Feedback => self.feedback,
            EchoParam::Wet => self.wet,
        }
    }

    fn set_param(&mut self, param: EchoParam, value: f32) {
        match param {
            EchoParam::Time => {
                self.time = value.clamp(0.0, MAX_ECHO_SECONDS);
                let samples = (self.time * self.sample_rate).round() as usize;
                self.delay_samples = samples.clamp(1, self.buffer.len() - 1);
            }
            EchoParam::Feedback => self.feedback = value.clamp(0.0, MAX_FEEDBACK),
            EchoParam::Wet => self.wet = value.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    #[test]
    fn first_repeat_arrives_after_delay_time() {
        let mut echo = Echo::new(SAMPLE_RATE, 0.1, 0.0, 499.0, 1.0);
        let mut out = Vec::new();
        out.push(echo.process(1.0));
        for _ in 0..150 {
            out.push(echo.process(0.0));
        }
        assert_eq!(out[0], 1.0, "dry signal passes through");
        assert!(out[1..100].iter().all(|s| *s == 0.0));
        assert!(out[100] > 0.1, "echo expected at 100 samples, got {}", out[100]);
    }

    #[test]
    fn feedback_is_clamped_below_unity() {
        let mut echo = Echo::new(SAMPLE_RATE, 0.05, 0.4, 400.0, 0.2);
        echo.set_param(EchoParam::Feedback, 3.0);
        assert_eq!(echo.get_param(EchoParam::Feedback), MAX_FEEDBACK);
        echo.set_param(EchoParam::Time, -1.0);
        assert_eq!(echo.get_param(EchoParam::Time), 0.0);
    }

    #[test]
    fn tail_decays_with_feedback() {
        let mut echo = Echo::new(SAMPLE_RATE, 0.01, 0.5, 400.0, 1.0);
        echo.process(1.0);
        let mut late_peak = 0.0f32;
        for i in 0..2_000 {
            let out = echo.process(0.0);
            assert!(out.is_finite());
            if i > 1_500 {
                late_peak = late_peak.max(out.abs());
            }
        }
        assert!(late_peak < 1e-3, "tail should die away, peak {late_peak}");
    }
}
