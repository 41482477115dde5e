//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use hls_transcode_lib::probe::DEFAULT_SUBTITLE_EXTENSIONS;
use hls_transcode_lib::TranscoderSettings;

/// Runtime mode. Development mode exposes transcoder command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("dev") {
            Environment::Dev
        } else {
            Environment::Production
        }
    }
}

/// Media library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Root directory all request paths are relative to
    pub media_path: Option<PathBuf>,

    /// Extensions recognised as sibling subtitle files
    pub subtitle_extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_path: None,
            subtitle_extensions: DEFAULT_SUBTITLE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Segment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Target segment duration in seconds
    pub duration_secs: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { duration_secs: 6.0 }
    }
}

/// Prober configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub ffprobe_path: PathBuf,

    /// Prober wall-clock limit in seconds
    pub timeout_secs: u64,

    /// Time-to-live for cached probe results in seconds
    pub cache_ttl_secs: u64,

    /// Interval of the expired-entry sweep in seconds
    pub sweep_interval_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout_secs: 30,
            cache_ttl_secs: 30 * 60,
            sweep_interval_secs: 60,
        }
    }
}

/// Transcoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    pub ffmpeg_path: PathBuf,

    /// Transcoder wall-clock limit per segment in seconds
    pub timeout_secs: u64,

    /// Directory for input aliases; system temp dir when unset
    pub scratch_dir: Option<PathBuf>,

    /// Render node for VA-API decoding
    pub hwaccel_device: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            timeout_secs: 120,
            scratch_dir: None,
            hwaccel_device: "/dev/dri/renderD128".to_string(),
        }
    }
}

impl TranscodeConfig {
    pub fn settings(&self) -> TranscoderSettings {
        TranscoderSettings {
            ffmpeg: self.ffmpeg_path.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            scratch_dir: self
                .scratch_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            hwaccel_device: self.hwaccel_device.clone(),
        }
    }
}

/// Direct download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Hand byte serving to the front-end proxy
    pub sendfile: bool,

    /// Internal-redirect header name
    pub sendfile_header: String,

    /// Prefix prepended to the media path in the redirect
    pub sendfile_base: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            sendfile: false,
            sendfile_header: "X-Accel-Redirect".to_string(),
            sendfile_base: "/".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    pub environment: Environment,

    pub media: MediaConfig,

    pub segment: SegmentConfig,

    pub probe: ProbeConfig,

    pub transcode: TranscodeConfig,

    pub download: DownloadConfig,

    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::default(),
            media: MediaConfig::default(),
            segment: SegmentConfig::default(),
            probe: ProbeConfig::default(),
            transcode: TranscodeConfig::default(),
            download: DownloadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_dev(&self) -> bool {
        self.environment == Environment::Dev
    }

    /// Override settings from `VP_*` environment variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("VP_MEDIA_PATH").filter(|v| !v.is_empty()) {
            self.media.media_path = Some(PathBuf::from(path));
        }
        if let Some(env) = lookup("VP_ENV") {
            self.environment = Environment::parse(&env);
        }
        if let Some(sendfile) = lookup("VP_SENDFILE") {
            self.download.sendfile = matches!(
                sendfile.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(header) = lookup("VP_SENDFILE_HEADER").filter(|v| !v.is_empty()) {
            self.download.sendfile_header = header;
        }
        if let Some(base) = lookup("VP_SENDFILE_BASE") {
            self.download.sendfile_base = base;
        }
        if let Some(exts) = lookup("VP_MEDIA_SUBTITLE").filter(|v| !v.is_empty()) {
            self.media.subtitle_extensions = exts
                .split('|')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }
    }
}
