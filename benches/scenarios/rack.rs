//! Benchmarks for the whole default rack, the way the audio callback runs it.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthsmith::{
    engine::engine_channel,
    instrument::{InstrumentRack, InstrumentSpec},
    EngineConfig,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// Notes held on every track: a chord per melodic track, one kick.
const CHORD: [u8; 4] = [48, 52, 55, 59];

pub fn bench_rack(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/rack");
    let specs = InstrumentSpec::default_rack();

    for &size in BLOCK_SIZES {
        let Ok(config) = EngineConfig::new(SAMPLE_RATE, size) else {
            continue;
        };
        let mut buffer = vec![0.0f32; size];

        // rack only, every melodic track holding a four-note chord
        let mut rack = InstrumentRack::new(&specs, &config, 0);
        rack.trigger_at(0, 36, 0.0, 600.0);
        for track in 1..rack.len() {
            for note in CHORD {
                rack.trigger_at(track, note, 0.0, 600.0);
            }
        }
        let mut frame = 0u64;
        group.bench_with_input(BenchmarkId::new("chords", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                rack.render_add(black_box(&mut buffer), frame);
                frame += size as u64;
            })
        });

        // full engine: message drain, rack and master bus, stereo out
        let (mut handle, mut engine) = engine_channel(config, &specs, 256, 0);
        for track in 1..specs.len() {
            for note in CHORD {
                // 16 triggers, well under the ring capacity
                let _ = handle.queue_trigger(track, note, 0.0, 600.0);
            }
        }
        let mut stereo = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("engine_stereo", size), &size, |b, _| {
            b.iter(|| engine.render_interleaved(black_box(&mut stereo), 2))
        });
    }

    group.finish();
}
