//! On-demand HLS server
//!
//! Serves media files from a local library as VOD playlists whose segments
//! are transcoded to MPEG-TS by an external ffmpeg when requested, plus
//! ranged direct downloads of the originals.

mod config;
mod config_file;
mod error;
mod http;
mod library;
mod state;

#[cfg(test)]
mod integration;

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hls_transcode_lib::ProcessRunner;

use crate::config::{LoggingConfig, ServerConfig};
use crate::config_file::{generate_default_config, ConfigFile};
use crate::error::{Result, ServerError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "hls-transcode-server";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = APP_NAME, version, about = "On-demand HLS transcoding server")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Media library root
    #[arg(long)]
    media_path: Option<PathBuf>,

    /// Log output format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,

    /// Write a default configuration file to the config path and exit
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.media_path {
            config.media.media_path = Some(path.clone());
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

/// Defaults, overlaid by the config file if there is one. A file that
/// fails to load is reported back and otherwise ignored.
fn load_config_file(path: &Path) -> (ServerConfig, Option<String>) {
    if !path.exists() {
        return (ServerConfig::default(), None);
    }
    match ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_server_config(), None),
        Err(e) => (
            ServerConfig::default(),
            Some(format!(
                "Failed to load config file {}: {}. Using defaults.",
                path.display(),
                e
            )),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init_config {
        generate_default_config(&args.config)
            .map_err(|e| ServerError::Config(e.to_string()))?;
        println!("Wrote {}", args.config.display());
        return Ok(());
    }

    let (mut config, load_error) = load_config_file(&args.config);
    config.apply_env(|key| std::env::var(key).ok());
    args.apply(&mut config);

    init_logging(&config.logging);
    if let Some(e) = load_error {
        tracing::warn!("{}", e);
    }

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::info!("Configuration loaded: {:?}", config);

    let state = Arc::new(AppState::new(config.clone(), Arc::new(ProcessRunner::new()))?);
    tracing::info!("Serving media from {}", state.library.root().display());

    // Background task: sweep expired probe results.
    {
        let state_bg = Arc::clone(&state);
        let every = Duration::from_secs(config.probe.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let removed = state_bg.probe.cache().sweep_expired();
                if removed > 0 {
                    tracing::info!("Evicted {} expired probe result(s)", removed);
                }
            }
        });
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| ServerError::Config(format!("bad listen address: {}", e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "hls_transcode_server={level},hls_transcode_lib={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}
