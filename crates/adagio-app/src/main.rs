//! # Adagio
//!
//! Plays music that follows what is happening in the game. Detected game
//! states arrive one token per line on stdin (`docking`, `conflictZone`,
//! `Menu`, ...).

use adagio_audio::{output, CpalOutput, PlaybackEngine};
use adagio_core::{GameState, PlayerConfig};
use adagio_director::{CatalogSelector, Director, DirectorConfig, SnippetCatalog, StaticMoodMap};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time left for a fade-out to play before the stream closes.
const FADE_GRACE: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(name = "adagio")]
#[command(about = "Adaptive soundtrack player driven by game-state detection")]
#[command(version)]
struct Args {
    /// Directory holding the snippet WAV files
    #[arg(short, long, env = "ADAGIO_SNIPPET_DIR")]
    snippet_dir: Option<PathBuf>,

    /// Player configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How many snippets ahead the program must reach before it is extended
    #[arg(long, default_value_t = 2)]
    lookahead: usize,

    /// Snippets queued per selection
    #[arg(long, default_value_t = 8)]
    batch_size: usize,

    /// Output device name (default device when omitted)
    #[arg(short, long)]
    device: Option<String>,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Log filter, overriding RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = match &args.log {
        Some(filter) => tracing_subscriber::EnvFilter::try_new(filter)
            .with_context(|| format!("invalid log filter '{filter}'"))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "adagio=info,adagio_audio=info,adagio_director=debug".into()),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting Adagio v{}", env!("CARGO_PKG_VERSION"));

    if args.list_devices {
        let default = output::default_device_name();
        for name in output::list_output_devices()? {
            let marker = if Some(&name) == default.as_ref() { " (default)" } else { "" };
            println!("{name}{marker}");
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PlayerConfig::from_json(&json)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => PlayerConfig::default(),
    };
    if let Some(dir) = args.snippet_dir {
        config.snippet_dir = dir;
    }

    let catalog = SnippetCatalog::scan(&config.snippet_dir)
        .with_context(|| format!("failed to scan {}", config.snippet_dir.display()))?;
    if catalog.is_empty() {
        warn!("No snippets found in {}", config.snippet_dir.display());
    }

    let director_config = DirectorConfig {
        lookahead_distance: args.lookahead,
        batch_size: args.batch_size,
    };
    let selector = CatalogSelector::new(catalog, director_config.batch_size);
    let mut director = Director::new(director_config, StaticMoodMap::default(), selector);

    let mut device = args
        .device
        .map_or_else(CpalOutput::new, CpalOutput::with_device_name);
    let mut engine = PlaybackEngine::new(config);
    engine.open_stream(&mut device)?;

    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read game state")?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<GameState>() {
            Ok(state) => {
                director.tick(&engine, state);
            }
            Err(e) => warn!("{e}"),
        }
    }

    info!("Input closed, fading out");
    engine.fade_and_stop_playback();
    std::thread::sleep(FADE_GRACE);

    if engine.missed_callbacks() > 0 {
        warn!(
            "{} audio callbacks played silence while the pipeline was busy",
            engine.missed_callbacks()
        );
    }
    engine.close_stream()?;
    Ok(())
}
