//! jogwheel - command-line player
//!
//! Loads an audio file fully into memory, then plays it through the default
//! (or named) output device with gapless lookahead scheduling, reporting the
//! playback position once a second until the end of the track or Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jogwheel::audio::{decode, AudioOutput};
use jogwheel::playback::{PlaybackEngine, TrackFrameSource, Transport};
use jogwheel::PlayerConfig;

/// Command-line arguments for jogwheel
#[derive(Parser, Debug)]
#[command(name = "jogwheel")]
#[command(about = "Gapless audio player with a scrubbable transport")]
#[command(version)]
struct Args {
    /// Audio file to play
    #[arg(required_unless_present = "list_devices")]
    file: Option<PathBuf>,

    /// Frame length in samples per channel
    #[arg(short, long, default_value_t = 4096, env = "JOGWHEEL_BUFFER_SIZE")]
    buffer_size: u32,

    /// Output device name (default device if omitted)
    #[arg(short, long, env = "JOGWHEEL_DEVICE")]
    device: Option<String>,

    /// Start playback from this content frame instead of the beginning
    #[arg(long)]
    start_frame: Option<u64>,

    /// List available output devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jogwheel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.list_devices {
        for name in AudioOutput::list_devices().context("Failed to enumerate devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = PlayerConfig {
        buffer_size: args.buffer_size,
        device: args.device.clone(),
    };
    config.validate().context("Invalid configuration")?;

    let file = args.file.context("FILE argument is required")?;
    let track = decode::load_track(&file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let frame_count = track.frame_count(config.buffer_size);
    let track = Arc::new(track);

    let (mut output, events) = AudioOutput::new(config.device.clone(), Some(config.buffer_size))
        .context("Failed to open audio device")?;

    if output.sample_rate() != track.sample_rate {
        warn!(
            "device rate {} Hz != track rate {} Hz, playback speed will be off",
            output.sample_rate(),
            track.sample_rate
        );
    }

    output.start().context("Failed to start audio output")?;

    let source = TrackFrameSource::new(Arc::clone(&track));
    let transport = Transport::new(output.handle(), source, config.buffer_size, frame_count)
        .context("Failed to create transport")?;

    let engine = PlaybackEngine::new(transport, events);
    engine.start().context("Failed to start playback engine")?;

    if let Some(frame) = args.start_frame {
        engine.seek_to_frame(frame);
    }
    engine.play().context("Failed to start playback")?;

    let total = format_time(track.duration_seconds());
    let mut tick = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            _ = tick.tick() => {
                match engine.current_head_frame() {
                    Some(frame) => {
                        let position = track.frame_to_seconds(frame, config.buffer_size);
                        info!("{} / {}  (frame {}/{})", format_time(position), total, frame, frame_count);
                    }
                    None if !engine.is_playing() => {
                        info!("end of track");
                        break;
                    }
                    None => {}
                }
            }
        }
    }

    engine.pause();
    engine.shutdown();

    let stats = engine.lag_stats();
    info!(
        "lag stats: {}  (underruns: {})",
        serde_json::to_string(&stats)?,
        output.underruns()
    );

    Ok(())
}

/// Format seconds as MM:SS for the position display
fn format_time(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}
