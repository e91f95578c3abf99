// Voices for every synthesis engine, the pool they live in, and the
// messages that reach them from the control thread.

pub mod drum;
pub mod granular;
pub mod lead;
pub mod message;
pub mod modal;
pub mod reed;
pub mod source;
pub mod string;
pub mod voice;

pub use granular::{CloudParams, GrainCloud, GRAIN_POOL_SIZE};
pub use message::{EngineMessage, MessageReceiver};
pub use source::SourceBuffer;
pub use voice::{SynthVoice, VoicePool};
