//! `synthsmith play` - audio stream, transport thread and terminal UI

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use tracing::info;

use synthsmith::{
    engine::{engine_channel, Scheduler, Transport},
    instrument::InstrumentSpec,
    synth::SourceBuffer,
    EngineConfig, SchedulerConfig,
};

use super::{load_sequence, ui::UiApp, PlayArgs};

/// Render block handed to the engine inside the device callback.
const BLOCK_SIZE: usize = 256;
/// Control messages in flight between the transport thread and the callback.
const MESSAGE_CAPACITY: usize = 1024;
/// Mono samples buffered for the scope and spectrum.
const SCOPE_CAPACITY: usize = 8192;

pub fn run(args: PlayArgs) -> EyreResult<()> {
    let sequence = load_sequence(args.project.as_deref())?;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let supported = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        bail!(
            "output device wants {:?} samples, only f32 is supported",
            supported.sample_format()
        );
    }

    let sample_rate = supported.sample_rate().0 as f32;
    let channels = supported.channels() as usize;
    let config = EngineConfig::new(sample_rate, BLOCK_SIZE)?;
    let specs = InstrumentSpec::default_rack();

    let (mut handle, mut engine) = engine_channel(config, &specs, MESSAGE_CAPACITY, args.seed);

    if let Some(path) = &args.grain_source {
        let source = load_grain_source(path, sample_rate)?;
        match specs.iter().position(|s| *s == InstrumentSpec::GranularCloud) {
            Some(track) => handle.set_source(track, &source)?,
            None => bail!("no granular track in the rack to receive {}", path.display()),
        }
    }

    let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_CAPACITY);
    let stream = device.build_output_stream(
        &supported.into(),
        move |data: &mut [f32], _| {
            engine.render_interleaved(data, channels);
            for frame in data.chunks(channels) {
                // the UI drops behind sometimes; losing scope samples is fine
                if scope_tx.push(frame[0]).is_err() {
                    break;
                }
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;
    stream.play()?;

    info!(sample_rate, channels, bpm = args.bpm, "audio stream running");

    let clock = Arc::clone(handle.clock());
    let scheduler = Scheduler::new(SchedulerConfig::default(), args.bpm)?;
    let transport = Transport::spawn(scheduler, sequence.clone(), handle, clock)?;

    let labels = specs.iter().map(InstrumentSpec::label).collect();
    let mut app = UiApp::new(transport, scope_rx, sequence, labels, sample_rate);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    app.shutdown();
    drop(stream);
    result
}

/// Read a WAV file as mono f32 at `sample_rate`.
fn load_grain_source(path: &Path, sample_rate: f32) -> EyreResult<SourceBuffer> {
    let mut reader = hound::WavReader::open(path)
        .wrap_err_with(|| format!("failed to open grain source {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    info!(
        path = %path.display(),
        frames = mono.len(),
        from = spec.sample_rate,
        "loaded grain source"
    );
    Ok(SourceBuffer::resampled(&mono, spec.sample_rate as f32, sample_rate)?)
}
