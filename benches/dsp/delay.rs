//! Benchmarks for the waveguide delay line.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthsmith::dsp::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // string periods at 48kHz: A4, A2, lowest representable
    let delays: &[usize] = &[109, 436, 2047];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &delay_samples in delays {
            let mut line = DelayLine::new();
            line.set_delay(delay_samples);
            group.bench_with_input(
                BenchmarkId::new(format!("process_{delay_samples}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for &sample in &input {
                            sum += line.process(black_box(sample));
                        }
                        sum
                    })
                },
            );
        }

        // Karplus-Strong style feedback: read, average, write back
        let mut line = DelayLine::new();
        line.set_delay(109);
        group.bench_with_input(BenchmarkId::new("feedback_loop", size), &size, |b, _| {
            b.iter(|| {
                let mut last = 0.0f32;
                for _ in 0..size {
                    let out = line.read();
                    line.write(black_box(0.996 * 0.5 * (out + last)));
                    last = out;
                }
                last
            })
        });
    }

    group.finish();
}
