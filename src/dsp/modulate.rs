//! Parameter modulation through a named-parameter interface.
/*
Parameter Modulation
====================

A modulator never reaches into the node it modulates. The target exposes its
parameters through [`Modulatable`]: named, bounded getters and setters. The
modulator holds only a parameter id, a base value and a depth.

    modulated_value = base_value + (modulator × depth)

Example: echo feedback with the master "vibe"
    base_value = 0.4, depth = 0.2, LFO swinging -1 to +1
    LFO = -1.0  →  feedback = 0.2
    LFO =  0.0  →  feedback = 0.4
    LFO = +1.0  →  feedback = 0.6

Block-Rate Updates
------------------

Targets are updated once per render block with the AVERAGE of the LFO over
that block. At 128 samples and 44.1 kHz that is ~345 updates per second, far
more than a 0.1 Hz sweep needs, and the target never recomputes coefficients
inside its sample loop.

Clamping
--------

The target owns its valid range. `set_param` clamps, so a modulator pushed
past the range produces a flat spot, never an invalid value.
*/

use crate::{dsp::lfo::Lfo, MAX_BLOCK_SIZE};

/// Anything with named, bounded parameters a modulator may drive.
pub trait Modulatable: Send {
    type Param: Copy + Send;

    fn get_param(&self, param: Self::Param) -> f32;

    /// Set a parameter, clamping to its valid range.
    fn set_param(&mut self, param: Self::Param, value: f32);

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        self.set_param(param, base + modulation);
    }
}

/// Calculate the modulated parameter value.
#[inline]
pub fn apply_modulation(base_value: f32, modulator: f32, depth: f32) -> f32 {
    base_value + (modulator * depth)
}

/// Average of a modulator signal over a block.
#[inline]
pub fn block_average(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}

/// An LFO bound to one parameter of a [`Modulatable`] target.
pub struct Modulation<P> {
    lfo: Lfo,
    param: P,
    base: f32,
    depth: f32,
    lfo_buffer: [f32; MAX_BLOCK_SIZE],
}

impl<P: Copy + Send> Modulation<P> {
    pub fn new(lfo: Lfo, param: P, base: f32, depth: f32) -> Self {
        Self {
            lfo,
            param,
            base,
            depth,
            lfo_buffer: [0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn param(&self) -> P {
        self.param
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn set_rate(&mut self, frequency: f32) {
        self.lfo.set_frequency(frequency);
    }

    pub fn rate(&self) -> f32 {
        self.lfo.frequency()
    }

    /// Advance the LFO by `frames` and push the block average into `target`.
    pub fn apply<T>(&mut self, target: &mut T, frames: usize)
    where
        T: Modulatable<Param = P> + ?Sized,
    {
        let frames = frames.min(MAX_BLOCK_SIZE);
        if frames == 0 {
            return;
        }
        let block = &mut self.lfo_buffer[..frames];
        self.lfo.render(block);
        let modulator = block_average(block);
        target.apply_modulation(self.param, self.base, modulator * self.depth);
    }
}
