//! Benchmarks for one sounding voice of each synthesis engine.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthsmith::{
    instrument::WindPreset,
    synth::{
        granular::{CloudParams, CloudState, GranularVoice},
        modal::ModalVoice,
        reed::ReedVoice,
        string::StringVoice,
        SourceBuffer, SynthVoice,
    },
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// Long enough that no voice finishes while being measured.
const NOTE_SECONDS: f32 = 600.0;

fn run<V: SynthVoice>(voice: &mut V, shared: &V::Shared, buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        *sample = voice.next_sample(shared);
    }
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    let cloud = CloudState {
        source: SourceBuffer::harmonic_drone(SAMPLE_RATE).as_slice().into(),
        params: CloudParams::default(),
    };
    let dense_cloud = CloudState {
        params: CloudParams {
            density: 100.0,
            grain_size: 1.0,
            ..CloudParams::default()
        },
        ..cloud.clone()
    };

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Karplus-Strong string, A2
        let mut string = StringVoice::new(SAMPLE_RATE);
        string.start(110.0, 0.9999, NOTE_SECONDS);
        string.pluck(0.8, 1);
        group.bench_with_input(BenchmarkId::new("string", size), &size, |b, _| {
            b.iter(|| run(&mut string, &(), black_box(&mut buffer)))
        });

        // Reed waveguide, clarinet envelope
        let mut reed = ReedVoice::new(SAMPLE_RATE);
        reed.start(
            220.0,
            0.75,
            WindPreset::Clarinet.reflection(),
            NOTE_SECONDS,
            WindPreset::Clarinet.envelope(SAMPLE_RATE, NOTE_SECONDS),
        );
        group.bench_with_input(BenchmarkId::new("reed", size), &size, |b, _| {
            b.iter(|| run(&mut reed, &(), black_box(&mut buffer)))
        });

        // Four-mode bank
        let mut bar = ModalVoice::new(SAMPLE_RATE);
        bar.start(440.0);
        group.bench_with_input(BenchmarkId::new("modal", size), &size, |b, _| {
            b.iter(|| run(&mut bar, &(), black_box(&mut buffer)))
        });

        // Granular cloud at default density, and with the grain pool saturated
        let mut grains = GranularVoice::new(SAMPLE_RATE);
        grains.start(57, NOTE_SECONDS, 1);
        group.bench_with_input(BenchmarkId::new("granular", size), &size, |b, _| {
            b.iter(|| run(&mut grains, &cloud, black_box(&mut buffer)))
        });

        let mut grains = GranularVoice::new(SAMPLE_RATE);
        grains.start(57, NOTE_SECONDS, 1);
        group.bench_with_input(BenchmarkId::new("granular_dense", size), &size, |b, _| {
            b.iter(|| run(&mut grains, &dense_cloud, black_box(&mut buffer)))
        });
    }

    group.finish();
}
