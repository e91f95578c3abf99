//! Benchmarks for low-level DSP primitives.

mod delay;
mod distortion;
mod envelope;
mod one_pole;
mod oscillator;
mod reverb;

pub use delay::bench_delay;
pub use distortion::bench_distortion;
pub use envelope::bench_envelope;
pub use one_pole::bench_one_pole;
pub use oscillator::bench_oscillator;
pub use reverb::bench_reverb;
