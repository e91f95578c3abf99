//! Error types for control-side operations.
//!
//! The audio path never returns these: voices clamp, skip or drop. Errors only
//! surface where a caller can act on them (construction, parameter lookup,
//! messaging and offline render).

use thiserror::Error;

/// Errors raised while configuring or driving an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Sample rate outside the supported range.
    #[error("sample rate {sample_rate} Hz is not supported")]
    InvalidSampleRate {
        /// The rejected rate.
        sample_rate: f32,
    },

    /// Block size of zero or above the engine maximum.
    #[error("block size {block_size} must be between 1 and {max}")]
    InvalidBlockSize {
        /// The rejected size.
        block_size: usize,
        /// Largest supported block.
        max: usize,
    },

    /// Tempo that is zero, negative or not finite.
    #[error("tempo {tempo} BPM must be a positive number")]
    InvalidTempo {
        /// The rejected tempo.
        tempo: f64,
    },

    /// Track index with no instrument bound to it.
    #[error("track {track} does not exist (rack has {tracks} tracks)")]
    UnknownTrack {
        /// Requested track.
        track: usize,
        /// Number of bound tracks.
        tracks: usize,
    },

    /// Parameter name the instrument kind does not expose.
    #[error("instrument '{kind}' has no parameter '{name}'")]
    UnknownParam {
        /// Name as passed by the caller.
        name: String,
        /// Instrument kind that was asked.
        kind: &'static str,
    },

    /// A step event that cannot be scheduled.
    #[error("invalid step event at step {step}: {reason}")]
    InvalidEvent {
        /// Step index of the event.
        step: usize,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Granular source buffer with no samples.
    #[error("source buffer is empty")]
    EmptySourceBuffer,

    /// The scheduler was started while already running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// The lock-free message ring had no free slot.
    #[error("message queue is full ({capacity} slots)")]
    QueueFull {
        /// Ring capacity.
        capacity: usize,
    },

    /// The transport thread could not be started.
    #[error("failed to spawn transport thread")]
    Spawn(#[source] std::io::Error),

    /// Sequence JSON that does not match the wire format.
    #[cfg(feature = "serde")]
    #[error("malformed sequence JSON")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort an offline render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tempo that is zero, negative or not finite.
    #[error("cannot render at tempo {tempo} BPM")]
    InvalidTempo {
        /// The rejected tempo.
        tempo: f64,
    },

    /// No instruments were supplied for the render.
    #[error("offline render needs at least one instrument")]
    EmptyRack,

    /// Rendered length would exceed the offline limit.
    #[error("render of {seconds:.1} s exceeds the {max_seconds:.0} s limit")]
    TooLong {
        /// Requested length.
        seconds: f64,
        /// Maximum allowed length.
        max_seconds: f64,
    },

    /// Engine construction failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
