use std::sync::Arc;

use crate::{
    config::EngineConfig,
    dsp::Modulatable,
    engine::TriggerSink,
    instrument::{Instrument, InstrumentSpec, Param},
    MAX_BLOCK_SIZE,
};

struct RackTrack {
    instrument: Instrument,
    muted: bool,
    solo: bool,
}

/// One instrument per sequence track, mixed to mono.
///
/// When any track is soloed only soloed tracks are heard; otherwise every
/// unmuted track is. Silenced tracks keep rendering so their voices age
/// with the clock.
pub struct InstrumentRack {
    tracks: Vec<RackTrack>,
    scratch: Box<[f32]>,
    config: EngineConfig,
}

impl InstrumentRack {
    pub fn new(specs: &[InstrumentSpec], config: &EngineConfig, seed: u64) -> Self {
        let tracks = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| RackTrack {
                instrument: Instrument::new(*spec, config, seed.wrapping_add(i as u64)),
                muted: false,
                solo: false,
            })
            .collect();
        Self {
            tracks,
            scratch: vec![0.0; MAX_BLOCK_SIZE].into_boxed_slice(),
            config: *config,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn instrument(&self, track: usize) -> Option<&Instrument> {
        self.tracks.get(track).map(|t| &t.instrument)
    }

    pub fn instrument_mut(&mut self, track: usize) -> Option<&mut Instrument> {
        self.tracks.get_mut(track).map(|t| &mut t.instrument)
    }

    /// Start a note at `time` seconds on the audio clock. Unknown tracks are
    /// a silent no-op.
    pub fn trigger_at(&mut self, track: usize, note: u8, time: f64, duration: f32) -> bool {
        let start = self.config.seconds_to_frames(time);
        match self.tracks.get_mut(track) {
            Some(t) => t.instrument.trigger(note, start, duration),
            None => false,
        }
    }

    pub fn set_param(&mut self, track: usize, param: Param, value: f32) {
        if let Some(inst) = self.instrument_mut(track) {
            inst.set_param(param, value);
        }
    }

    pub fn set_mute(&mut self, track: usize, muted: bool) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.muted = muted;
        }
    }

    pub fn set_solo(&mut self, track: usize, solo: bool) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.solo = solo;
        }
    }

    /// See [`Instrument::replace_source`]. Unknown tracks hand `buffer` back.
    pub fn replace_source(&mut self, track: usize, buffer: Arc<[f32]>) -> Arc<[f32]> {
        match self.instrument_mut(track) {
            Some(inst) => inst.replace_source(buffer),
            None => buffer,
        }
    }

    pub fn all_notes_off(&mut self, block_start: u64) {
        for t in self.tracks.iter_mut() {
            t.instrument.release_all(block_start);
        }
    }

    pub fn is_audible(&self, track: usize) -> bool {
        let any_solo = self.tracks.iter().any(|t| t.solo);
        self.tracks
            .get(track)
            .is_some_and(|t| if any_solo { t.solo } else { !t.muted })
    }

    /// Mix every audible track into `out`. `out` must not exceed
    /// [`MAX_BLOCK_SIZE`]; longer buffers are rendered in chunks.
    pub fn render_add(&mut self, out: &mut [f32], block_start: u64) {
        let any_solo = self.tracks.iter().any(|t| t.solo);
        let mut frame = block_start;
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let scratch = &mut self.scratch[..chunk.len()];
            for t in self.tracks.iter_mut() {
                t.instrument.render(scratch, frame);
                let audible = if any_solo { t.solo } else { !t.muted };
                if audible {
                    for (o, s) in chunk.iter_mut().zip(scratch.iter()) {
                        *o += *s;
                    }
                }
            }
            frame += chunk.len() as u64;
        }
    }

    pub fn active_voices(&self) -> usize {
        self.tracks.iter().map(|t| t.instrument.active_voices()).sum()
    }

    pub fn dropped_triggers(&self) -> u64 {
        self.tracks.iter().map(|t| t.instrument.dropped_triggers()).sum()
    }

    pub fn dropped_spawns(&self) -> u64 {
        self.tracks.iter().map(|t| t.instrument.dropped_spawns()).sum()
    }
}

impl TriggerSink for InstrumentRack {
    fn trigger(&mut self, track: usize, note: u8, time: f64, duration: f32) {
        self.trigger_at(track, note, time, duration);
    }
}
