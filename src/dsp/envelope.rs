/*
Breakpoint Envelopes
====================

Every voice in this crate knows its whole future at trigger time: the note
starts at a known frame and lasts a known number of seconds. So instead of a
gate-driven ADSR state machine, the envelope is a short list of breakpoints
scheduled up front, the same way a mixing console automates a fader.

Vocabulary
----------

  breakpoint  A (time, value, curve) triple. Time is seconds since the voice
              started; the envelope arrives at `value` exactly at `time`.

  curve       How the level travels from the previous breakpoint:
                Linear       straight line
                Exponential  constant ratio per sample (sounds "natural")
                Hold         stays put, then jumps to the value at `time`

  level       Current output. Multiplies whatever the envelope controls:
              amplitude, oscillator frequency, breath pressure.


The Math: Per-Sample Steps
--------------------------

Each segment is converted to a per-sample step when it begins, so the inner
loop is one add or one multiply.

  Linear:       step = (target - level) / samples
                level += step

  Exponential:  step = (target / level) ^ (1 / samples)
                level *= step

Example: kick pitch sweep, 150 Hz → 0.01 Hz over 0.5 s at 44.1 kHz
  - samples = 22050
  - step = (0.01 / 150) ^ (1 / 22050) ≈ 0.999564
  - after 22050 samples: 150 × 0.999564^22050 ≈ 0.01

An exponential ramp can never reach or cross zero. When the start or target
is zero (or they differ in sign) the segment falls back to a linear ramp.


Monotonic Time
--------------

Breakpoint times are clamped so each one is at or after the previous one. A
note shorter than its attack therefore still lands on every target, with the
later segments collapsing to zero length.


Release
-------

`release(seconds)` throws away the remaining schedule and fades from the
current level to zero. That is how "all notes off" silences voices without a
click.
*/

/// Breakpoints an envelope can hold. Fixed so envelopes stay `Copy`-sized and
/// allocation-free on the audio thread.
pub const MAX_SEGMENTS: usize = 6;

/// Below this magnitude an exponential ramp is treated as zero.
const EXP_FLOOR: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Hold,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    target: f32,
    end: u32, // absolute sample index
    curve: Curve,
}

const EMPTY_SEGMENT: Segment = Segment {
    target: 0.0,
    end: 0,
    curve: Curve::Hold,
};

#[derive(Debug, Clone)]
pub struct Envelope {
    segments: [Segment; MAX_SEGMENTS],
    len: usize,
    sample_rate: f32,

    // Runtime state
    index: usize,
    position: u32,
    level: f32,
    step: f32,
    stepping: Curve,
}

impl Envelope {
    /// Envelope resting at `initial` with nothing scheduled.
    pub fn new(initial: f32, sample_rate: f32) -> Self {
        Self {
            segments: [EMPTY_SEGMENT; MAX_SEGMENTS],
            len: 0,
            sample_rate: sample_rate.max(1.0),
            index: 0,
            position: 0,
            level: initial,
            step: 0.0,
            stepping: Curve::Hold,
        }
    }

    /// Straight line to `target`, arriving `at` seconds after the start.
    pub fn linear_to(self, target: f32, at: f32) -> Self {
        self.push(target, at, Curve::Linear)
    }

    /// Constant-ratio ramp to `target`, arriving `at` seconds after the start.
    pub fn exponential_to(self, target: f32, at: f32) -> Self {
        self.push(target, at, Curve::Exponential)
    }

    /// Keep the current level until `at`.
    pub fn hold_until(self, at: f32) -> Self {
        let held = self.last_target();
        self.push(held, at, Curve::Hold)
    }

    /// Jump to `value` at `at`.
    pub fn set_at(self, value: f32, at: f32) -> Self {
        self.push(value, at, Curve::Hold)
    }

    fn last_target(&self) -> f32 {
        if self.len == 0 {
            self.level
        } else {
            self.segments[self.len - 1].target
        }
    }

    fn push(mut self, target: f32, at: f32, curve: Curve) -> Self {
        debug_assert!(self.len < MAX_SEGMENTS, "envelope breakpoint overflow");
        if self.len == MAX_SEGMENTS {
            return self;
        }
        let earliest = if self.len == 0 {
            0
        } else {
            self.segments[self.len - 1].end
        };
        let end = ((at.max(0.0) * self.sample_rate).round() as u32).max(earliest);
        self.segments[self.len] = Segment { target, end, curve };
        self.len += 1;
        if self.len == 1 {
            self.begin_segment();
        }
        self
    }

    fn begin_segment(&mut self) {
        while self.index < self.len {
            let segment = self.segments[self.index];
            if segment.end <= self.position {
                self.level = segment.target;
                self.index += 1;
                continue;
            }
            let samples = (segment.end - self.position) as f32;
            self.stepping = segment.curve;
            self.step = match segment.curve {
                Curve::Hold => 0.0,
                Curve::Linear => (segment.target - self.level) / samples,
                Curve::Exponential => {
                    let same_sign = self.level.signum() == segment.target.signum();
                    if same_sign
                        && self.level.abs() > EXP_FLOOR
                        && segment.target.abs() > EXP_FLOOR
                    {
                        (segment.target / self.level).powf(1.0 / samples)
                    } else {
                        self.stepping = Curve::Linear;
                        (segment.target - self.level) / samples
                    }
                }
            };
            return;
        }
        self.stepping = Curve::Hold;
    }

    /// Current level, then advance one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let out = self.level;
        self.position = self.position.saturating_add(1);

        if self.index < self.len {
            let segment = self.segments[self.index];
            if self.position >= segment.end {
                self.level = segment.target;
                self.index += 1;
                self.begin_segment();
            } else {
                match self.stepping {
                    Curve::Hold => {}
                    Curve::Linear => self.level += self.step,
                    Curve::Exponential => self.level *= self.step,
                }
            }
        }

        out
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Drop the remaining schedule and fade to zero over `seconds`.
    pub fn release(&mut self, seconds: f32) {
        let samples = ((seconds.max(0.0) * self.sample_rate).round() as u32).max(1);
        self.segments[0] = Segment {
            target: 0.0,
            end: self.position.saturating_add(samples),
            curve: Curve::Linear,
        };
        self.len = 1;
        self.index = 0;
        self.begin_segment();
    }

    /// True once every breakpoint has been reached.
    pub fn is_finished(&self) -> bool {
        self.index >= self.len
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Samples elapsed since the envelope started.
    pub fn position(&self) -> u32 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn render_samples(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn linear_ramp_lands_on_target() {
        let mut env = Envelope::new(0.0, SAMPLE_RATE).linear_to(0.5, 0.01);

        render_samples(&mut env, 5);
        assert!((env.level() - 0.25).abs() < 1e-4, "halfway through the ramp");

        render_samples(&mut env, 5);
        assert!((env.level() - 0.5).abs() < 1e-6);
        assert!(env.is_finished());
    }

    #[test]
    fn exponential_ramp_follows_constant_ratio() {
        let mut env = Envelope::new(1.0, SAMPLE_RATE).exponential_to(0.01, 0.5);

        render_samples(&mut env, 250);
        // geometric midpoint of 1.0 and 0.01
        assert!((env.level() - 0.1).abs() < 1e-3, "got {}", env.level());

        render_samples(&mut env, 250);
        assert!((env.level() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn exponential_to_zero_falls_back_to_linear() {
        let mut env = Envelope::new(1.0, SAMPLE_RATE).exponential_to(0.0, 0.1);
        render_samples(&mut env, 50);
        assert!((env.level() - 0.5).abs() < 1e-3);
        render_samples(&mut env, 50);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn hold_then_jump() {
        let mut env = Envelope::new(0.0, SAMPLE_RATE)
            .linear_to(1.0, 0.01)
            .hold_until(0.05)
            .set_at(0.0, 0.06);

        render_samples(&mut env, 30);
        assert_eq!(env.level(), 1.0);
        render_samples(&mut env, 29);
        assert_eq!(env.level(), 1.0, "level holds until the jump");
        render_samples(&mut env, 1);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn out_of_order_times_are_clamped() {
        // 20 ms attack on a 5 ms note: the release lands right after the attack
        let mut env = Envelope::new(0.0, SAMPLE_RATE)
            .linear_to(1.0, 0.02)
            .linear_to(0.0, 0.005);

        render_samples(&mut env, 19);
        assert!((env.level() - 0.95).abs() < 1e-4);
        render_samples(&mut env, 1);
        assert_eq!(env.level(), 0.0, "collapsed segment lands together with the attack");
        assert!(env.is_finished());
    }

    #[test]
    fn release_fades_from_current_level() {
        let mut env = Envelope::new(0.0, SAMPLE_RATE)
            .linear_to(1.0, 0.01)
            .hold_until(10.0);

        render_samples(&mut env, 20);
        env.release(0.01);
        assert!(!env.is_finished());

        render_samples(&mut env, 5);
        assert!((env.level() - 0.5).abs() < 1e-4);
        render_samples(&mut env, 5);
        assert_eq!(env.level(), 0.0);
        assert!(env.is_finished());
    }

    #[test]
    fn zero_time_breakpoint_applies_immediately() {
        let env = Envelope::new(0.0, SAMPLE_RATE).set_at(0.7, 0.0);
        assert_eq!(env.level(), 0.7);
        assert!(env.is_finished());
    }
}
