//! Low-level DSP primitives used by the voices and the master bus.
//!
//! These components are allocation-free after construction and realtime-safe,
//! making them safe to embed directly inside voice structs. They stay focused
//! on the signal-processing math; voices and instruments layer scheduling and
//! parameter handling on top.

/// Fixed-capacity waveguide delay line.
pub mod delay;
/// Waveshaping distortion.
pub mod distortion;
/// Feedback echo for the master bus.
pub mod echo;
/// Scheduled breakpoint envelopes.
pub mod envelope;
pub mod lfo;
/// Named-parameter modulation.
pub mod modulate;
/// Single-pole lowpass used in waveguide loops.
pub mod one_pole;
/// Band-limited phase-accumulator oscillators.
pub mod oscillator;
pub mod reverb;

pub use delay::DelayLine;
pub use envelope::Envelope;
pub use modulate::{Modulatable, Modulation};
pub use one_pole::OnePole;
pub use oscillator::{Oscillator, OscillatorWaveform};
