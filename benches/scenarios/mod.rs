//! Real-world scenario benchmarks: one voice of each engine, and the whole
//! default rack under load.

mod rack;
mod voices;

pub use rack::bench_rack;
pub use voices::bench_voices;
