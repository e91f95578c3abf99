//! Instruments: one closed set of kinds, each owning a fixed voice pool.
//!
//! [`InstrumentSpec`] is the control-side description (kind and preset).
//! [`Instrument`] is the audio-side state built from it. Trigger dispatch is a
//! single match over [`InstrumentKind`].

pub mod params;
pub mod presets;
mod rack;

use std::sync::Arc;

pub use params::{Param, ParamSpec};
pub use presets::{LeadPreset, PercussionPreset, StringPreset, WindPreset};
pub use rack::InstrumentRack;

use crate::{
    config::EngineConfig,
    dsp::Modulatable,
    error::EngineError,
    midi_to_freq,
    synth::{
        drum::{DrumSound, DrumVoice},
        granular::{CloudParams, CloudState, GranularVoice},
        lead::{LeadVoice, LEAD_TAIL},
        modal::ModalVoice,
        reed::ReedVoice,
        source::SourceBuffer,
        string::StringVoice,
        voice::VoicePool,
    },
};

/// Voices each instrument can sound at once.
pub const VOICES_PER_INSTRUMENT: usize = 16;

// How long a voice may keep sounding past its note.
const STRING_TAIL: f32 = 1.0;
const MODAL_TAIL: f32 = 1.0;
const REED_TAIL: f32 = 0.2;
const GRANULAR_TAIL: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentSpec {
    AnalogLead(LeadPreset),
    StringModel(StringPreset),
    ReedModel(WindPreset),
    ModalPercussion(PercussionPreset),
    GranularCloud,
}

impl InstrumentSpec {
    /// One instrument per default track: drums, guitar, clarinet, bass, cloud.
    pub fn default_rack() -> Vec<InstrumentSpec> {
        vec![
            InstrumentSpec::ModalPercussion(PercussionPreset::DrumKit),
            InstrumentSpec::StringModel(StringPreset::AcousticGuitar),
            InstrumentSpec::ReedModel(WindPreset::Clarinet),
            InstrumentSpec::AnalogLead(LeadPreset::Bass),
            InstrumentSpec::GranularCloud,
        ]
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            InstrumentSpec::AnalogLead(_) => "analog",
            InstrumentSpec::StringModel(_) => "string",
            InstrumentSpec::ReedModel(_) => "reed",
            InstrumentSpec::ModalPercussion(_) => "modal",
            InstrumentSpec::GranularCloud => "granular",
        }
    }

    /// Short label for displays.
    pub fn label(&self) -> &'static str {
        match self {
            InstrumentSpec::AnalogLead(p) => p.name(),
            InstrumentSpec::StringModel(p) => p.name(),
            InstrumentSpec::ReedModel(p) => p.name(),
            InstrumentSpec::ModalPercussion(p) => p.name(),
            InstrumentSpec::GranularCloud => "Granular",
        }
    }

    pub fn param_specs(&self) -> &'static [ParamSpec] {
        match self {
            InstrumentSpec::AnalogLead(_) => params::LEAD_PARAMS,
            InstrumentSpec::StringModel(_) => params::STRING_PARAMS,
            InstrumentSpec::ReedModel(_) => params::REED_PARAMS,
            InstrumentSpec::ModalPercussion(_) => params::MODAL_PARAMS,
            InstrumentSpec::GranularCloud => params::GRANULAR_PARAMS,
        }
    }

    /// Resolve a wire name against this kind's parameter table.
    pub fn resolve_param(&self, name: &str) -> Result<Param, EngineError> {
        Param::from_name(name)
            .filter(|p| params::lookup(self.param_specs(), *p).is_some())
            .ok_or_else(|| EngineError::UnknownParam {
                name: name.to_owned(),
                kind: self.kind_name(),
            })
    }
}

pub enum InstrumentKind {
    AnalogLead {
        preset: LeadPreset,
        voices: VoicePool<LeadVoice>,
    },
    StringModel {
        preset: StringPreset,
        decay: f32,
        voices: VoicePool<StringVoice>,
    },
    ReedModel {
        preset: WindPreset,
        pressure: f32,
        voices: VoicePool<ReedVoice>,
    },
    ModalPercussion {
        preset: PercussionPreset,
        bars: VoicePool<ModalVoice>,
        drums: VoicePool<DrumVoice>,
    },
    GranularCloud {
        cloud: CloudState,
        voices: VoicePool<GranularVoice>,
    },
}

pub struct Instrument {
    spec: InstrumentSpec,
    kind: InstrumentKind,
    gain: f32,
    frequency: f32,
    sample_rate: f32,
    seed: u64,
}

impl Instrument {
    /// Build the instrument and preallocate its voices. Granular clouds start
    /// on the built-in drone.
    pub fn new(spec: InstrumentSpec, config: &EngineConfig, seed: u64) -> Self {
        let sr = config.sample_rate();
        let n = VOICES_PER_INSTRUMENT;
        let kind = match spec {
            InstrumentSpec::AnalogLead(preset) => InstrumentKind::AnalogLead {
                preset,
                voices: VoicePool::new(n, || LeadVoice::new(sr)),
            },
            InstrumentSpec::StringModel(preset) => InstrumentKind::StringModel {
                preset,
                decay: preset.decay(),
                voices: VoicePool::new(n, || StringVoice::new(sr)),
            },
            InstrumentSpec::ReedModel(preset) => InstrumentKind::ReedModel {
                preset,
                pressure: default_of(&spec, Param::Pressure),
                voices: VoicePool::new(n, || ReedVoice::new(sr)),
            },
            InstrumentSpec::ModalPercussion(preset) => InstrumentKind::ModalPercussion {
                preset,
                bars: VoicePool::new(n, || ModalVoice::new(sr)),
                drums: VoicePool::new(n, || DrumVoice::new(sr)),
            },
            InstrumentSpec::GranularCloud => InstrumentKind::GranularCloud {
                cloud: CloudState {
                    source: SourceBuffer::harmonic_drone(sr).shared(),
                    params: CloudParams::default(),
                },
                voices: VoicePool::new(n, || GranularVoice::new(sr)),
            },
        };

        Self {
            spec,
            kind,
            gain: 1.0,
            frequency: default_of(&spec, Param::Frequency),
            sample_rate: sr,
            seed,
        }
    }

    pub fn spec(&self) -> InstrumentSpec {
        self.spec
    }

    pub fn kind(&self) -> &InstrumentKind {
        &self.kind
    }

    pub fn param_specs(&self) -> &'static [ParamSpec] {
        self.spec.param_specs()
    }

    pub fn supports(&self, param: Param) -> bool {
        params::lookup(self.param_specs(), param).is_some()
    }

    fn next_seed(&mut self) -> u64 {
        self.seed = self.seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        self.seed
    }

    fn frames(&self, seconds: f32) -> u64 {
        (seconds.max(0.0) as f64 * self.sample_rate as f64).round() as u64
    }

    /// Start `note` at `start_frame` for `duration` seconds.
    ///
    /// Returns false when no voice was created: an unplayable pitch, a drum
    /// kit note with no drum, or a full pool.
    pub fn trigger(&mut self, note: u8, start_frame: u64, duration: f32) -> bool {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        let seed = self.next_seed();
        let sr = self.sample_rate;
        let mut frequency = midi_to_freq(note);
        if let InstrumentKind::StringModel { preset, .. } = &self.kind {
            frequency *= preset.frequency_scale();
        }
        if !(frequency.is_finite() && frequency > 0.0) {
            return false;
        }

        let tail = match &self.kind {
            InstrumentKind::AnalogLead { .. } => LEAD_TAIL,
            InstrumentKind::StringModel { .. } => STRING_TAIL,
            InstrumentKind::ReedModel { .. } => REED_TAIL,
            InstrumentKind::ModalPercussion { .. } => MODAL_TAIL,
            InstrumentKind::GranularCloud { .. } => GRANULAR_TAIL,
        };
        let end_frame = start_frame + self.frames(duration + tail);

        match &mut self.kind {
            InstrumentKind::AnalogLead { preset, voices } => {
                let waveform = preset.waveform();
                voices
                    .allocate(start_frame, end_frame)
                    .map(|v| v.start(waveform, frequency, duration))
                    .is_some()
            }
            InstrumentKind::StringModel {
                preset,
                decay,
                voices,
            } => {
                let (decay, brightness) = (*decay, preset.brightness());
                voices
                    .allocate(start_frame, end_frame)
                    .map(|v| {
                        v.start(frequency, decay, duration + STRING_TAIL);
                        v.pluck(brightness, seed);
                    })
                    .is_some()
            }
            InstrumentKind::ReedModel {
                preset,
                pressure,
                voices,
            } => {
                let (preset, pressure) = (*preset, *pressure);
                voices
                    .allocate(start_frame, end_frame)
                    .map(|v| {
                        v.start(
                            frequency,
                            pressure,
                            preset.reflection(),
                            duration,
                            preset.envelope(sr, duration),
                        )
                    })
                    .is_some()
            }
            InstrumentKind::ModalPercussion {
                preset: PercussionPreset::DrumKit,
                drums,
                ..
            } => {
                let Some(sound) = DrumSound::from_note(note) else {
                    return false;
                };
                let end = start_frame + (sound.length() as f64 * sr as f64).round() as u64;
                drums
                    .allocate(start_frame, end)
                    .map(|v| v.start(sound, seed))
                    .is_some()
            }
            InstrumentKind::ModalPercussion { bars, .. } => bars
                .allocate(start_frame, end_frame)
                .map(|v| v.start(frequency))
                .is_some(),
            InstrumentKind::GranularCloud { voices, .. } => voices
                .allocate(start_frame, end_frame)
                .map(|v| v.start(note, duration, seed))
                .is_some(),
        }
    }

    /// Render one block starting at `block_start` into `out`, overwriting it.
    pub fn render(&mut self, out: &mut [f32], block_start: u64) {
        out.fill(0.0);
        match &mut self.kind {
            InstrumentKind::AnalogLead { voices, .. } => voices.render_add(out, block_start, &()),
            InstrumentKind::StringModel { voices, .. } => voices.render_add(out, block_start, &()),
            InstrumentKind::ReedModel { voices, .. } => voices.render_add(out, block_start, &()),
            InstrumentKind::ModalPercussion { bars, drums, .. } => {
                bars.render_add(out, block_start, &());
                drums.render_add(out, block_start, &());
            }
            InstrumentKind::GranularCloud { cloud, voices } => {
                voices.render_add(out, block_start, cloud)
            }
        }
        if self.gain != 1.0 {
            for sample in out.iter_mut() {
                *sample *= self.gain;
            }
        }
    }

    /// Fade every live voice out; voices not yet started are cancelled.
    pub fn release_all(&mut self, block_start: u64) {
        match &mut self.kind {
            InstrumentKind::AnalogLead { voices, .. } => voices.release_all(block_start),
            InstrumentKind::StringModel { voices, .. } => voices.release_all(block_start),
            InstrumentKind::ReedModel { voices, .. } => voices.release_all(block_start),
            InstrumentKind::ModalPercussion { bars, drums, .. } => {
                bars.release_all(block_start);
                drums.release_all(block_start);
            }
            InstrumentKind::GranularCloud { voices, .. } => voices.release_all(block_start),
        }
    }

    /// Swap the granular source. Returns whichever buffer is no longer in
    /// use: the old source, or `buffer` itself if this is not a granular
    /// instrument or `buffer` is empty.
    pub fn replace_source(&mut self, buffer: Arc<[f32]>) -> Arc<[f32]> {
        match &mut self.kind {
            InstrumentKind::GranularCloud { cloud, .. } if !buffer.is_empty() => {
                std::mem::replace(&mut cloud.source, buffer)
            }
            _ => buffer,
        }
    }

    pub fn active_voices(&self) -> usize {
        match &self.kind {
            InstrumentKind::AnalogLead { voices, .. } => voices.active_count(),
            InstrumentKind::StringModel { voices, .. } => voices.active_count(),
            InstrumentKind::ReedModel { voices, .. } => voices.active_count(),
            InstrumentKind::ModalPercussion { bars, drums, .. } => {
                bars.active_count() + drums.active_count()
            }
            InstrumentKind::GranularCloud { voices, .. } => voices.active_count(),
        }
    }

    /// Triggers lost to a full voice pool.
    pub fn dropped_triggers(&self) -> u64 {
        match &self.kind {
            InstrumentKind::AnalogLead { voices, .. } => voices.dropped(),
            InstrumentKind::StringModel { voices, .. } => voices.dropped(),
            InstrumentKind::ReedModel { voices, .. } => voices.dropped(),
            InstrumentKind::ModalPercussion { bars, drums, .. } => bars.dropped() + drums.dropped(),
            InstrumentKind::GranularCloud { voices, .. } => voices.dropped(),
        }
    }

    /// Grain spawns lost to full grain pools, summed over live voices.
    pub fn dropped_spawns(&self) -> u64 {
        match &self.kind {
            InstrumentKind::GranularCloud { voices, .. } => {
                let mut total = 0;
                voices.for_each_live(|v| total += v.cloud().dropped());
                total
            }
            _ => 0,
        }
    }
}

fn default_of(spec: &InstrumentSpec, param: Param) -> f32 {
    params::lookup(spec.param_specs(), param)
        .map(|s| s.default)
        .unwrap_or(0.0)
}

impl Modulatable for Instrument {
    type Param = Param;

    fn get_param(&self, param: Param) -> f32 {
        match (param, &self.kind) {
            (Param::Gain, _) => self.gain,
            (Param::Frequency, InstrumentKind::GranularCloud { .. }) => 0.0,
            (Param::Frequency, _) => self.frequency,
            (Param::Decay, InstrumentKind::StringModel { decay, .. }) => *decay,
            (Param::Pressure, InstrumentKind::ReedModel { pressure, .. }) => *pressure,
            (Param::Position, InstrumentKind::GranularCloud { cloud, .. }) => cloud.params.position,
            (Param::Spread, InstrumentKind::GranularCloud { cloud, .. }) => cloud.params.spread,
            (Param::GrainSize, InstrumentKind::GranularCloud { cloud, .. }) => {
                cloud.params.grain_size
            }
            (Param::Density, InstrumentKind::GranularCloud { cloud, .. }) => cloud.params.density,
            (Param::Pitch, InstrumentKind::GranularCloud { cloud, .. }) => cloud.params.pitch,
            _ => 0.0,
        }
    }

    /// Parameters the kind does not expose are ignored.
    fn set_param(&mut self, param: Param, value: f32) {
        let Some(spec) = params::lookup(self.param_specs(), param) else {
            return;
        };
        let value = spec.clamp(value, self.sample_rate);

        match (param, &mut self.kind) {
            (Param::Gain, _) => self.gain = value,
            (Param::Frequency, kind) => {
                self.frequency = value;
                match kind {
                    InstrumentKind::AnalogLead { voices, .. } => {
                        voices.for_each_active(|v| v.set_frequency(value))
                    }
                    InstrumentKind::StringModel { voices, .. } => {
                        voices.for_each_active(|v| v.set_frequency(value))
                    }
                    InstrumentKind::ReedModel { voices, .. } => {
                        voices.for_each_active(|v| v.set_frequency(value))
                    }
                    InstrumentKind::ModalPercussion { bars, .. } => {
                        bars.for_each_active(|v| v.set_frequency(value))
                    }
                    InstrumentKind::GranularCloud { .. } => {}
                }
            }
            (Param::Decay, InstrumentKind::StringModel { decay, voices, .. }) => {
                *decay = value;
                voices.for_each_active(|v| v.set_decay(value));
            }
            (Param::Pressure, InstrumentKind::ReedModel { pressure, voices, .. }) => {
                *pressure = value;
                voices.for_each_active(|v| v.set_pressure(value));
            }
            (Param::Position, InstrumentKind::GranularCloud { cloud, .. }) => {
                cloud.params.position = value
            }
            (Param::Spread, InstrumentKind::GranularCloud { cloud, .. }) => {
                cloud.params.spread = value
            }
            (Param::GrainSize, InstrumentKind::GranularCloud { cloud, .. }) => {
                cloud.params.grain_size = value
            }
            (Param::Density, InstrumentKind::GranularCloud { cloud, .. }) => {
                cloud.params.density = value
            }
            (Param::Pitch, InstrumentKind::GranularCloud { cloud, .. }) => {
                cloud.params.pitch = value
            }
            _ => {}
        }
    }
}
