use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::{engine::master::MasterParam, instrument::Param};

/// Control-to-audio traffic. Everything here is applied at a block boundary.
#[derive(Debug, Clone)]
pub enum EngineMessage {
    /// Start a note at `time` seconds on the audio clock.
    Trigger {
        track: usize,
        note: u8,
        time: f64,
        duration: f32,
    },
    SetParam {
        track: usize,
        param: Param,
        value: f32,
    },
    SetMute {
        track: usize,
        muted: bool,
    },
    SetSolo {
        track: usize,
        solo: bool,
    },
    /// Replace a granular track's source. The old buffer comes back through
    /// [`MessageReceiver::retire`].
    SetSourceBuffer {
        track: usize,
        buffer: Arc<[f32]>,
    },
    /// Adjust one master-bus control; the bus clamps `value`.
    SetMaster {
        param: MasterParam,
        value: f32,
    },
    /// Fade every sounding voice out over a few milliseconds.
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<EngineMessage>;

    /// Hand back a buffer the audio thread no longer uses. The default drops
    /// it in place, which is only acceptable off the audio thread.
    fn retire(&mut self, buffer: Arc<[f32]>) {
        drop(buffer);
    }
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<EngineMessage> {
    fn pop(&mut self) -> Option<EngineMessage> {
        Consumer::pop(self).ok()
    }
}

/// Audio-side end of the engine rings: incoming messages plus a return ring
/// for buffers that must be freed on the control thread.
#[cfg(feature = "rtrb")]
pub struct EngineChannel {
    messages: Consumer<EngineMessage>,
    retired: Producer<Arc<[f32]>>,
}

#[cfg(feature = "rtrb")]
impl EngineChannel {
    pub fn new(messages: Consumer<EngineMessage>, retired: Producer<Arc<[f32]>>) -> Self {
        Self { messages, retired }
    }
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for EngineChannel {
    fn pop(&mut self) -> Option<EngineMessage> {
        self.messages.pop().ok()
    }

    fn retire(&mut self, buffer: Arc<[f32]>) {
        // A full return ring means the control side stopped collecting;
        // freeing here is the lesser evil.
        let _ = self.retired.push(buffer);
    }
}
