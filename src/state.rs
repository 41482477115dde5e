//! Application state
//!
//! Everything a handler needs, built once at startup and shared behind an
//! `Arc`.

use std::sync::Arc;
use std::time::Duration;

use hls_transcode_lib::{MediaProbe, SegmentTranscoder, ToolRunner};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::library::MediaLibrary;

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub library: MediaLibrary,
    pub probe: MediaProbe,
    pub transcoder: SegmentTranscoder,
}

impl AppState {
    /// Build the state. Both external tools run through `runner`.
    pub fn new(config: ServerConfig, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        let media_path = config.media.media_path.clone().ok_or_else(|| {
            ServerError::Config(
                "media path is not set (VP_MEDIA_PATH, [media] media_path or --media-path)"
                    .to_string(),
            )
        })?;
        if !(config.segment.duration_secs.is_finite() && config.segment.duration_secs > 0.0) {
            return Err(ServerError::Config(format!(
                "segment duration must be positive, got {}",
                config.segment.duration_secs
            )));
        }

        let library = MediaLibrary::new(&media_path)?;
        let probe = MediaProbe::new(
            runner.clone(),
            config.probe.ffprobe_path.clone(),
            Duration::from_secs(config.probe.timeout_secs),
            Duration::from_secs(config.probe.cache_ttl_secs),
        );
        let transcoder = SegmentTranscoder::new(runner, config.transcode.settings());

        Ok(Self {
            config,
            library,
            probe,
            transcoder,
        })
    }

    pub fn is_dev(&self) -> bool {
        self.config.is_dev()
    }

    pub fn segment_length(&self) -> f64 {
        self.config.segment.duration_secs
    }
}
