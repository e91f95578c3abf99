//! Lookahead step sequencing and physical-model synthesis.
//!
//! The crate is split the same way the audio is: a control side that owns the
//! [`Sequence`](sequencing::Sequence) and walks it with the lookahead
//! [`Scheduler`](engine::Scheduler), and an audio side that renders voices
//! inside fixed pools without allocating, locking or logging.

pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod instrument; // Tagged union of instrument kinds and their presets
pub mod sequencing; // Step grid, wire format and undo history
pub mod synth; // Voices for every synthesis engine

pub use config::{DurationScale, EngineConfig, SchedulerConfig};
pub use error::{EngineError, RenderError};

/// Largest block the engine will render in one pass.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Capacity of every waveguide delay line.
pub const MAX_DELAY_SAMPLES: usize = 2048;

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note.min(127) as f32 - 69.0) / 12.0)
}
