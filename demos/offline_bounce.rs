//! Build a one-bar groove across all five default instruments, print it as
//! project JSON and bounce it to `bounce.wav`.
//!
//! Run with: cargo run --example offline_bounce

use synthsmith::{
    engine::render_offline,
    instrument::InstrumentSpec,
    sequencing::{Sequence, StepEvent},
    EngineConfig,
};

fn note(note: u8, duration: f32) -> StepEvent {
    StepEvent {
        note,
        velocity: 0.9,
        duration,
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // kicks on one and three, snare on two and four, hats on the offbeats
    let mut sequence = Sequence::default_pattern();
    for step in [4, 12] {
        sequence.set_step(0, step, note(38, 1.0))?;
    }
    for step in [2, 6, 10, 14] {
        sequence.set_step(0, step, note(42, 1.0))?;
    }
    // guitar arpeggio, clarinet line, bass pulse, and a cloud pad under it all
    for (step, pitch) in [(0, 52), (3, 55), (6, 59), (9, 64), (12, 59)] {
        sequence.set_step(1, step, note(pitch, 2.0))?;
    }
    sequence.set_step(2, 8, note(67, 6.0))?;
    for step in (0..16).step_by(8) {
        sequence.set_step(3, step, note(40, 3.0))?;
    }
    sequence.set_step(4, 0, note(57, 16.0))?;

    println!("{}", sequence.to_json_pretty()?);

    let config = EngineConfig::default();
    let render = render_offline(&sequence, 100.0, &config, &InstrumentSpec::default_rack())?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: config.sample_rate() as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create("bounce.wav", spec)?;
    for sample in render.to_pcm_i16() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    println!(
        "Rendered {:.2}s ({} samples, peak {:.2}) to bounce.wav",
        render.duration_seconds(),
        render.samples.len(),
        render.peak()
    );
    Ok(())
}
