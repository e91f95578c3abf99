//! Benchmarks for the one-pole loop filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthsmith::dsp::OnePole;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_one_pole(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/one_pole");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.37).sin()).collect();

        let mut filter = OnePole::lowpass(2_000.0, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += filter.process(black_box(sample));
                }
                sum
            })
        });
    }

    group.finish();
}
