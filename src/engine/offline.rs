//! Offline render: replay a sequence once, with explicit timestamps, into a
//! buffer.
//!
//! The render builds its own rack, so it never touches a running realtime
//! engine. Event times come from tempo arithmetic only:
//!
//! ```text
//! time     = step / 4 · seconds_per_beat
//! duration = event.duration / 4 · seconds_per_beat
//! length   = ceil((last_step + 16) / 4 · seconds_per_beat · sample_rate)
//! ```
//!
//! where `last_step` is the latest `step + duration` and the extra 16 steps
//! leave a bar for tails to ring out. The master bus is not applied.

use std::collections::BTreeSet;

use tracing::info;

use crate::{
    config::{DurationScale, EngineConfig, SchedulerConfig},
    engine::scheduler::{Scheduler, TriggerSink},
    error::RenderError,
    instrument::{InstrumentRack, InstrumentSpec},
    sequencing::{Sequence, STEPS_PER_PATTERN},
};

/// Longest render accepted, in seconds.
pub const MAX_RENDER_SECONDS: f64 = 600.0;

#[derive(Debug, Clone)]
pub struct OfflineRender {
    pub samples: Vec<f32>,
    pub sample_rate: f32,
    /// Voices actually started.
    pub voices_started: usize,
    pub dropped_triggers: u64,
}

impl OfflineRender {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0, |m, s| m.max(s.abs()))
    }

    pub fn to_pcm_i16(&self) -> Vec<i16> {
        to_pcm_i16(&self.samples)
    }
}

/// One float sample as 16-bit PCM: clamped, negatives scaled by 32768 and
/// positives by 32767, truncated toward zero.
#[inline]
pub fn pcm_sample(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

pub fn to_pcm_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().copied().map(pcm_sample).collect()
}

/// Seconds the render of `sequence` at `tempo` will last.
pub fn render_seconds(sequence: &Sequence, tempo: f64) -> f64 {
    let seconds_per_beat = 60.0 / tempo;
    (sequence.last_step_end() + STEPS_PER_PATTERN as f64) / 4.0 * seconds_per_beat
}

/// Rack wrapper that counts the voices it actually starts.
struct CountingSink {
    rack: InstrumentRack,
    started: usize,
}

impl TriggerSink for CountingSink {
    fn trigger(&mut self, track: usize, note: u8, time: f64, duration: f32) {
        if self.rack.trigger_at(track, note, time, duration) {
            self.started += 1;
        }
    }
}

/// Render `sequence` at `tempo` through a fresh rack built from `specs`.
pub fn render_offline(
    sequence: &Sequence,
    tempo: f64,
    config: &EngineConfig,
    specs: &[InstrumentSpec],
) -> Result<OfflineRender, RenderError> {
    if !(tempo.is_finite() && tempo > 0.0) {
        return Err(RenderError::InvalidTempo { tempo });
    }
    if specs.is_empty() {
        return Err(RenderError::EmptyRack);
    }
    let seconds = render_seconds(sequence, tempo);
    if seconds > MAX_RENDER_SECONDS {
        return Err(RenderError::TooLong {
            seconds,
            max_seconds: MAX_RENDER_SECONDS,
        });
    }

    let sample_rate = config.sample_rate();
    let frames = (seconds * sample_rate as f64).ceil() as usize;
    let mut sink = CountingSink {
        rack: InstrumentRack::new(specs, config, 0),
        started: 0,
    };

    // same dispatch path as realtime, with one-sixteenth step units
    let mut scheduler = Scheduler::new(
        SchedulerConfig {
            duration_scale: DurationScale::Tempo,
            ..SchedulerConfig::default()
        },
        tempo,
    )?;
    let steps: BTreeSet<usize> = sequence
        .tracks()
        .iter()
        .flat_map(|t| t.steps().map(|(step, _)| step))
        .collect();
    let sixteenth = 60.0 / tempo / 4.0;
    let mut pending = steps.into_iter().peekable();

    // Each step is dispatched once the audio before it has been rendered,
    // so voices that ended earlier have already given their slot back. The
    // split points depend on the steps only, never on the block size.
    let mut samples = vec![0.0; frames];
    let mut block_start = 0u64;
    for block in samples.chunks_mut(config.block_size()) {
        let block_end = block_start + block.len() as u64;
        let mut cursor = block_start;
        while let Some(&step) = pending.peek() {
            let time = step as f64 * sixteenth;
            let start = config.seconds_to_frames(time);
            if start >= block_end {
                break;
            }
            if start > cursor {
                let (from, to) = ((cursor - block_start) as usize, (start - block_start) as usize);
                sink.rack.render_add(&mut block[from..to], cursor);
                cursor = start;
            }
            scheduler.schedule_note(step, time, sequence, &mut sink);
            pending.next();
        }
        let from = (cursor - block_start) as usize;
        sink.rack.render_add(&mut block[from..], cursor);
        block_start = block_end;
    }

    let render = OfflineRender {
        samples,
        sample_rate,
        voices_started: sink.started,
        dropped_triggers: sink.rack.dropped_triggers(),
    };
    info!(
        seconds = render.duration_seconds(),
        frames,
        voices = render.voices_started,
        dropped = render.dropped_triggers,
        peak = render.peak(),
        "offline render finished"
    );
    Ok(render)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_scales_each_polarity_separately() {
        assert_eq!(pcm_sample(1.0), 32_767);
        assert_eq!(pcm_sample(-1.0), -32_768);
        assert_eq!(pcm_sample(0.0), 0);
        assert_eq!(pcm_sample(2.5), 32_767);
        assert_eq!(pcm_sample(-7.0), -32_768);
        assert_eq!(pcm_sample(f32::NAN), 0);
        assert_eq!(pcm_sample(0.5), 16_383);
    }

    #[test]
    fn empty_sequence_renders_one_bar_of_silence() {
        let render = render_offline(
            &Sequence::new(5),
            120.0,
            &EngineConfig::default(),
            &InstrumentSpec::default_rack(),
        )
        .unwrap();
        assert_eq!(render.samples.len(), 88_200);
        assert!(render.samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn rejects_bad_tempo_and_empty_rack() {
        let seq = Sequence::default_pattern();
        let config = EngineConfig::default();
        assert!(matches!(
            render_offline(&seq, 0.0, &config, &InstrumentSpec::default_rack()),
            Err(RenderError::InvalidTempo { .. })
        ));
        assert!(matches!(
            render_offline(&seq, 120.0, &config, &[]),
            Err(RenderError::EmptyRack)
        ));
    }

    #[test]
    fn overlong_render_is_refused() {
        let seq = Sequence::default_pattern();
        let result = render_offline(
            &seq,
            0.5,
            &EngineConfig::default(),
            &InstrumentSpec::default_rack(),
        );
        assert!(matches!(result, Err(RenderError::TooLong { .. })));
    }
}
