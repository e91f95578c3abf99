//! `synthsmith render` - offline bounce to WAV

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing::info;

use synthsmith::{engine::render_offline, instrument::InstrumentSpec, EngineConfig};

use super::{load_sequence, RenderArgs};

pub fn run(args: RenderArgs) -> EyreResult<()> {
    let sequence = load_sequence(args.project.as_deref())?;
    let config = EngineConfig::new(args.sample_rate as f32, args.block_size)?;
    let specs = InstrumentSpec::default_rack();

    let render = render_offline(&sequence, args.bpm, &config, &specs)
        .wrap_err("offline render failed")?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&args.out, spec)
        .wrap_err_with(|| format!("failed to create {}", args.out.display()))?;
    for sample in render.to_pcm_i16() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    info!(
        path = %args.out.display(),
        seconds = render.duration_seconds(),
        peak = render.peak(),
        "wrote bounce"
    );
    Ok(())
}
