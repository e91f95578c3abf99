//! Benchmarks for breakpoint envelopes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthsmith::dsp::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Linear ramp, the cheapest segment
        let linear = Envelope::new(0.0, SAMPLE_RATE).linear_to(1.0, 60.0);
        group.bench_with_input(BenchmarkId::new("linear", size), &size, |b, _| {
            let mut env = linear.clone();
            b.iter(|| env.render(black_box(&mut buffer)))
        });

        // Exponential decay, one multiply per sample
        let exponential = Envelope::new(1.0, SAMPLE_RATE).exponential_to(0.001, 60.0);
        group.bench_with_input(BenchmarkId::new("exponential", size), &size, |b, _| {
            let mut env = exponential.clone();
            b.iter(|| env.render(black_box(&mut buffer)))
        });

        // Trumpet-like shape crossing several segments per block
        let shaped = Envelope::new(0.0, SAMPLE_RATE)
            .linear_to(1.0, 0.001)
            .exponential_to(0.7, 0.002)
            .hold_until(0.003)
            .linear_to(0.0, 0.004);
        group.bench_with_input(BenchmarkId::new("multi_segment", size), &size, |b, _| {
            b.iter(|| {
                let mut env = shaped.clone();
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
