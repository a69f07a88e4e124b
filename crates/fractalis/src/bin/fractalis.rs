//! # FRACTALIS Headless Runner
//!
//! Runs the frame loop against the recording backend and logs timing.
//! No window, no GPU.
//!
//! ```bash
//! # Built-in demo scene, every renderer enabled
//! fractalis
//!
//! # Custom scene, more logging
//! RUST_LOG=debug fractalis --config scene.toml --frames 120
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fractalis::rendering::RecordingBackend;
use fractalis::{FrameLoop, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fractalis",
    author,
    version,
    about = "Headless fractal, grapher and shape visualization runner"
)]
struct Cli {
    /// Settings file. The built-in demo scene is used when omitted.
    #[arg(long, value_name = "PATH", env = "FRACTALIS_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `[run] frames`.
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Overrides `[run] delta_time`, in seconds.
    #[arg(long, value_name = "SECONDS")]
    delta_time: Option<f32>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::demo(),
    };
    if let Some(frames) = cli.frames {
        settings.run.frames = frames;
    }
    if let Some(delta_time) = cli.delta_time {
        settings.run.delta_time = delta_time;
    }
    settings.validate()?;
    if settings.is_empty() {
        tracing::warn!("no renderer enabled; only timing will be recorded");
    }

    let mut frame_loop = FrameLoop::new(RecordingBackend::new(), &settings)?;
    let mut host = settings.run.orbit();
    frame_loop
        .run(&mut host, settings.run.frames, settings.run.delta_time)
        .context("frame failed")?;
    frame_loop.stats().log_summary();

    let backend = frame_loop.shutdown()?;
    tracing::info!(
        frames = backend.frames_submitted(),
        bytes_written = backend.bytes_written(),
        live_buffers = backend.live_buffers(),
        "shutdown complete"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
