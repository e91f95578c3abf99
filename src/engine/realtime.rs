use std::sync::Arc;

use crate::{
    config::EngineConfig,
    dsp::Modulatable,
    engine::{clock::AudioClock, master::MasterBus},
    instrument::{InstrumentRack, InstrumentSpec},
    synth::message::{EngineMessage, MessageReceiver},
    MAX_BLOCK_SIZE,
};

/// Audio-side engine: drains control messages at block boundaries, renders
/// the rack and runs the master bus.
///
/// Nothing in [`Engine::render`] allocates, locks or logs. Replaced source
/// buffers are handed back through the receiver instead of being dropped
/// here.
pub struct Engine<R> {
    rack: InstrumentRack,
    master: MasterBus,
    receiver: R,
    clock: Arc<AudioClock>,
    config: EngineConfig,
    mono: Box<[f32]>,
}

impl<R: MessageReceiver> Engine<R> {
    pub fn new(
        config: EngineConfig,
        specs: &[InstrumentSpec],
        receiver: R,
        clock: Arc<AudioClock>,
        seed: u64,
    ) -> Self {
        Self {
            rack: InstrumentRack::new(specs, &config, seed),
            master: MasterBus::new(&config),
            receiver,
            clock,
            config,
            mono: vec![0.0; MAX_BLOCK_SIZE].into_boxed_slice(),
        }
    }

    fn drain_messages(&mut self, block_start: u64) {
        while let Some(message) = self.receiver.pop() {
            match message {
                EngineMessage::Trigger {
                    track,
                    note,
                    time,
                    duration,
                } => {
                    self.rack.trigger_at(track, note, time, duration);
                }
                EngineMessage::SetParam {
                    track,
                    param,
                    value,
                } => self.rack.set_param(track, param, value),
                EngineMessage::SetMute { track, muted } => self.rack.set_mute(track, muted),
                EngineMessage::SetSolo { track, solo } => self.rack.set_solo(track, solo),
                EngineMessage::SetSourceBuffer { track, buffer } => {
                    let unused = self.rack.replace_source(track, buffer);
                    self.receiver.retire(unused);
                }
                EngineMessage::SetMaster { param, value } => self.master.set_param(param, value),
                EngineMessage::AllNotesOff => self.rack.all_notes_off(block_start),
            }
        }
    }

    /// Render mono audio into `out`, in blocks of the configured size.
    pub fn render(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(self.config.block_size()) {
            let block_start = self.clock.frames();
            self.drain_messages(block_start);

            chunk.fill(0.0);
            self.rack.render_add(chunk, block_start);
            self.master.process(chunk);
            self.clock.advance(chunk.len() as u64);
        }
    }

    /// Render into an interleaved buffer, copying the mono mix to every
    /// channel.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let block = self.config.block_size().min(MAX_BLOCK_SIZE);
        for frames in out.chunks_mut(block * channels) {
            let len = frames.len() / channels;
            let mut mono = std::mem::take(&mut self.mono);
            self.render(&mut mono[..len]);
            for (frame, sample) in frames.chunks_mut(channels).zip(mono.iter()) {
                frame.fill(*sample);
            }
            self.mono = mono;
        }
    }

    pub fn rack(&self) -> &InstrumentRack {
        &self.rack
    }

    pub fn master(&self) -> &MasterBus {
        &self.master
    }

    pub fn clock(&self) -> &Arc<AudioClock> {
        &self.clock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
