use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{trace, warn};

use crate::{
    config::EngineConfig,
    engine::{clock::AudioClock, master::MasterParam, realtime::Engine, scheduler::TriggerSink},
    error::EngineError,
    instrument::{InstrumentSpec, Param},
    synth::{
        message::{EngineChannel, EngineMessage},
        source::SourceBuffer,
    },
};

/// Returned buffers waiting to be freed on the control thread.
const RETIRE_CAPACITY: usize = 8;

/// Control-side end of an engine: validates requests and queues them for
/// the audio thread.
pub struct EngineHandle {
    messages: Producer<EngineMessage>,
    retired: Consumer<Arc<[f32]>>,
    specs: Vec<InstrumentSpec>,
    clock: Arc<AudioClock>,
    capacity: usize,
    dropped: u64,
}

/// Build a connected handle/engine pair with a ring of `capacity` messages.
pub fn engine_channel(
    config: EngineConfig,
    specs: &[InstrumentSpec],
    capacity: usize,
    seed: u64,
) -> (EngineHandle, Engine<EngineChannel>) {
    let capacity = capacity.max(1);
    let (messages, inbox) = RingBuffer::new(capacity);
    let (outbox, retired) = RingBuffer::new(RETIRE_CAPACITY);
    let clock = Arc::new(AudioClock::new(config.sample_rate()));

    let engine = Engine::new(
        config,
        specs,
        EngineChannel::new(inbox, outbox),
        Arc::clone(&clock),
        seed,
    );
    let handle = EngineHandle {
        messages,
        retired,
        specs: specs.to_vec(),
        clock,
        capacity,
        dropped: 0,
    };
    (handle, engine)
}

impl EngineHandle {
    fn send(&mut self, message: EngineMessage) -> Result<(), EngineError> {
        self.collect_retired();
        self.messages.push(message).map_err(|_| {
            self.dropped += 1;
            warn!(capacity = self.capacity, "engine message ring full, message dropped");
            EngineError::QueueFull {
                capacity: self.capacity,
            }
        })
    }

    fn spec(&self, track: usize) -> Result<&InstrumentSpec, EngineError> {
        self.specs.get(track).ok_or(EngineError::UnknownTrack {
            track,
            tracks: self.specs.len(),
        })
    }

    /// Queue a note for `time` seconds on the audio clock.
    pub fn queue_trigger(
        &mut self,
        track: usize,
        note: u8,
        time: f64,
        duration: f32,
    ) -> Result<(), EngineError> {
        self.spec(track)?;
        self.send(EngineMessage::Trigger {
            track,
            note,
            time,
            duration,
        })
    }

    /// Set a parameter by its wire name, e.g. `"grainSize"`.
    pub fn set_param(&mut self, track: usize, name: &str, value: f32) -> Result<(), EngineError> {
        let param = self.spec(track)?.resolve_param(name)?;
        self.set_param_value(track, param, value)
    }

    pub fn set_param_value(
        &mut self,
        track: usize,
        param: Param,
        value: f32,
    ) -> Result<(), EngineError> {
        self.spec(track)?;
        self.send(EngineMessage::SetParam {
            track,
            param,
            value,
        })
    }

    pub fn set_mute(&mut self, track: usize, muted: bool) -> Result<(), EngineError> {
        self.spec(track)?;
        self.send(EngineMessage::SetMute { track, muted })
    }

    pub fn set_solo(&mut self, track: usize, solo: bool) -> Result<(), EngineError> {
        self.spec(track)?;
        self.send(EngineMessage::SetSolo { track, solo })
    }

    /// Replace a granular track's source material.
    pub fn set_source(&mut self, track: usize, source: &SourceBuffer) -> Result<(), EngineError> {
        let spec = self.spec(track)?;
        if *spec != InstrumentSpec::GranularCloud {
            return Err(EngineError::UnknownParam {
                name: "source".to_owned(),
                kind: spec.kind_name(),
            });
        }
        self.send(EngineMessage::SetSourceBuffer {
            track,
            buffer: source.shared(),
        })
    }

    /// Set a master-bus control by its wire name, e.g. `"reverbMix"`.
    pub fn set_master(&mut self, name: &str, value: f32) -> Result<(), EngineError> {
        let param = MasterParam::from_name(name).ok_or_else(|| EngineError::UnknownParam {
            name: name.to_owned(),
            kind: "master",
        })?;
        self.set_master_value(param, value)
    }

    pub fn set_master_value(&mut self, param: MasterParam, value: f32) -> Result<(), EngineError> {
        self.send(EngineMessage::SetMaster { param, value })
    }

    pub fn all_notes_off(&mut self) -> Result<(), EngineError> {
        self.send(EngineMessage::AllNotesOff)
    }

    /// Free buffers the audio thread has finished with. Returns how many.
    pub fn collect_retired(&mut self) -> usize {
        let mut freed = 0;
        while let Ok(buffer) = self.retired.pop() {
            drop(buffer);
            freed += 1;
        }
        freed
    }

    pub fn clock(&self) -> &Arc<AudioClock> {
        &self.clock
    }

    pub fn specs(&self) -> &[InstrumentSpec] {
        &self.specs
    }

    /// Messages lost to a full ring.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped
    }
}

impl TriggerSink for EngineHandle {
    fn trigger(&mut self, track: usize, note: u8, time: f64, duration: f32) {
        if track >= self.specs.len() {
            trace!(track, "no instrument bound, event dropped");
            return;
        }
        // QueueFull is already logged and counted by `send`.
        let _ = self.send(EngineMessage::Trigger {
            track,
            note,
            time,
            duration,
        });
    }
}
