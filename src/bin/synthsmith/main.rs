//! synthsmith - terminal step sequencer with physical-model voices
//!
//! Run with: cargo run -- play
//!       or: cargo run -- render --out bounce.wav

mod app;
mod render;
mod ui;

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use synthsmith::sequencing::Sequence;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synthsmith", version, about = "Step sequencer with physical-model voices")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a project live with the terminal UI
    Play(PlayArgs),
    /// Bounce a project to a 16-bit mono WAV file
    Render(RenderArgs),
}

#[derive(Args)]
pub struct PlayArgs {
    /// Sequence JSON to load (defaults to the built-in kick pattern)
    #[arg(long)]
    pub project: Option<PathBuf>,
    #[arg(long, default_value_t = 120.0)]
    pub bpm: f64,
    /// WAV file used as the granular cloud's source material
    #[arg(long)]
    pub grain_source: Option<PathBuf>,
    /// Write logs here; the UI owns the terminal otherwise
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Args)]
pub struct RenderArgs {
    #[arg(long)]
    pub out: PathBuf,
    #[arg(long)]
    pub project: Option<PathBuf>,
    #[arg(long, default_value_t = 120.0)]
    pub bpm: f64,
    #[arg(long, default_value_t = 44_100)]
    pub sample_rate: u32,
    #[arg(long, default_value_t = 128)]
    pub block_size: usize,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Play(args) => {
            if let Some(path) = &args.log_file {
                init_file_logging(path)?;
            }
            app::run(args)
        }
        Command::Render(args) => {
            init_stderr_logging();
            render::run(args)
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn init_file_logging(path: &Path) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Load a project file, or fall back to the default pattern.
pub fn load_sequence(project: Option<&Path>) -> EyreResult<Sequence> {
    let Some(path) = project else {
        return Ok(Sequence::default_pattern());
    };
    let json = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read project {}", path.display()))?;
    Sequence::from_json(&json).wrap_err_with(|| format!("invalid project {}", path.display()))
}
