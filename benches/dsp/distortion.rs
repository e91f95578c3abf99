//! Benchmarks for the master-bus waveshaper.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthsmith::dsp::distortion::Waveshaper;

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for (name, amount) in [("mild", 5.0), ("heavy", 80.0)] {
            let shaper = Waveshaper::new(amount, 1.0);
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    shaper.process_buffer(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
