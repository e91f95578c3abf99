//! Timing and rendering: the lookahead scheduler on the control side, the
//! realtime engine on the audio side, and the offline renderer.

pub mod clock;
#[cfg(feature = "rtrb")]
pub mod handle;
pub mod master;
pub mod offline;
pub mod realtime;
pub mod scheduler;
#[cfg(feature = "rtrb")]
pub mod transport;

pub use clock::{AudioClock, Clock};
#[cfg(feature = "rtrb")]
pub use handle::{engine_channel, EngineHandle};
pub use master::{MasterBus, MasterParam};
pub use offline::{render_offline, to_pcm_i16, OfflineRender};
pub use realtime::Engine;
pub use scheduler::{Scheduler, TransportState, TriggerSink};
#[cfg(feature = "rtrb")]
pub use transport::{Transport, TransportCommand, TransportSink, TransportStatus};
