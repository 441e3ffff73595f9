//! sdplay-ap - Main entry point
//!
//! Plays one WAV file through the double-buffered engine. Playback runs on a
//! blocking thread; Ctrl+C / SIGTERM cancel it through the engine heartbeat.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sdplay_ap::audio::PlaybackSink;
use sdplay_ap::{EngineConfig, Error, PlaybackEngine, PlaybackReport};
use sdplay_common::config::{resolve_settings, ConfigOverrides, TomlConfig};
use tokio::signal;
use tracing::{error, info};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments for sdplay-ap
#[derive(Parser, Debug)]
#[command(name = "sdplay-ap")]
#[command(about = "Streaming WAV player with double-buffered mono output")]
#[command(version)]
struct Args {
    /// WAV file to play
    file: PathBuf,

    /// TOML configuration file
    #[arg(short, long, env = "SDPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Frames per chunk (slot capacity)
    #[arg(long)]
    chunk_samples: Option<usize>,

    /// Output volume, 0-255
    #[arg(short, long)]
    volume: Option<u8>,

    /// Sleep between sink polls in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Output device name
    #[arg(short, long)]
    device: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging comes up before config so config warnings are visible; the
    // configured level is applied once settings are resolved
    let log_handle =
        sdplay_common::logging::init(args.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))
            .context("Failed to initialise logging")?;

    let toml = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    let overrides = ConfigOverrides {
        chunk_samples: args.chunk_samples,
        volume: args.volume,
        poll_interval_ms: args.poll_interval_ms,
        device: args.device.clone(),
        log_level: args.log_level.clone(),
    };
    let settings = resolve_settings(&toml, &overrides);

    log_handle
        .set_level(&settings.log_level)
        .context("Invalid log level")?;

    info!("Starting sdplay-ap");
    info!(
        "Chunk: {} samples, volume: {}, poll interval: {}ms",
        settings.chunk_samples, settings.volume, settings.poll_interval_ms
    );

    let config = EngineConfig::from_settings(&settings);
    let device = settings.device.clone();
    let file = args.file.clone();
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancel);

    let mut playback = tokio::task::spawn_blocking(move || -> sdplay_ap::Result<PlaybackReport> {
        let mut engine = PlaybackEngine::new(open_sink(device), config)?;
        let mut heartbeat = move || {
            if cancel_flag.load(Ordering::Relaxed) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        engine.play_file(&file, &mut heartbeat)
    });

    let result = tokio::select! {
        joined = &mut playback => joined,
        _ = shutdown_signal() => {
            cancel.store(true, Ordering::Relaxed);
            playback.await
        }
    }
    .context("Playback task panicked")?;

    match result {
        Ok(report) => {
            info!(
                "Played {} ({} chunks, {:.2}s)",
                args.file.display(),
                report.chunks_submitted,
                report.audio_duration().as_secs_f64()
            );
            Ok(())
        }
        Err(Error::Cancelled) => {
            info!("Playback cancelled");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to play {}", args.file.display())),
    }
}

#[cfg(feature = "cpal")]
fn open_sink(device: Option<String>) -> Box<dyn PlaybackSink> {
    Box::new(sdplay_ap::audio::CpalSink::new(device))
}

#[cfg(not(feature = "cpal"))]
fn open_sink(device: Option<String>) -> Box<dyn PlaybackSink> {
    if let Some(name) = device {
        tracing::warn!("Built without the cpal feature, ignoring device '{}'", name);
    }
    info!("Using simulated real-time output");
    Box::new(sdplay_ap::audio::PacedSink::new())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping playback");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping playback");
        },
    }
}
