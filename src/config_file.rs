//! Configuration file support
//!
//! Loads server configuration from TOML files. Every section and key is
//! optional; missing ones keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{Environment, ServerConfig};

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: Option<ServerSettings>,
    /// Media library settings
    pub media: Option<MediaSettings>,
    /// Segment settings
    pub segment: Option<SegmentSettings>,
    /// Prober settings
    pub probe: Option<ProbeSettings>,
    /// Transcoder settings
    pub transcode: Option<TranscodeSettings>,
    /// Direct download settings
    pub download: Option<DownloadSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// `dev` or `production`
    pub environment: Option<Environment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaSettings {
    pub media_path: Option<PathBuf>,
    pub subtitle_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentSettings {
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeSettings {
    pub ffprobe_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscodeSettings {
    pub ffmpeg_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub scratch_dir: Option<PathBuf>,
    pub hwaccel_device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadSettings {
    pub sendfile: Option<bool>,
    pub sendfile_header: Option<String>,
    pub sendfile_base: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let d = ServerConfig::default();
        Self {
            server: Some(ServerSettings {
                host: Some(d.host),
                port: Some(d.port),
                environment: Some(d.environment),
            }),
            media: Some(MediaSettings {
                media_path: Some(PathBuf::from("/srv/media")),
                subtitle_extensions: Some(d.media.subtitle_extensions),
            }),
            segment: Some(SegmentSettings {
                duration_secs: Some(d.segment.duration_secs),
            }),
            probe: Some(ProbeSettings {
                ffprobe_path: Some(d.probe.ffprobe_path),
                timeout_secs: Some(d.probe.timeout_secs),
                cache_ttl_secs: Some(d.probe.cache_ttl_secs),
                sweep_interval_secs: Some(d.probe.sweep_interval_secs),
            }),
            transcode: Some(TranscodeSettings {
                ffmpeg_path: Some(d.transcode.ffmpeg_path),
                timeout_secs: Some(d.transcode.timeout_secs),
                scratch_dir: None,
                hwaccel_device: Some(d.transcode.hwaccel_device),
            }),
            download: Some(DownloadSettings {
                sendfile: Some(d.download.sendfile),
                sendfile_header: Some(d.download.sendfile_header),
                sendfile_base: Some(d.download.sendfile_base),
            }),
            logging: Some(LoggingSettings {
                level: Some(d.logging.level),
                format: Some(d.logging.format),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();

        if let Some(s) = self.server {
            config.host = s.host.unwrap_or(config.host);
            config.port = s.port.unwrap_or(config.port);
            config.environment = s.environment.unwrap_or(config.environment);
        }
        if let Some(m) = self.media {
            config.media.media_path = m.media_path.or(config.media.media_path);
            if let Some(exts) = m.subtitle_extensions {
                config.media.subtitle_extensions = exts;
            }
        }
        if let Some(s) = self.segment {
            config.segment.duration_secs = s.duration_secs.unwrap_or(config.segment.duration_secs);
        }
        if let Some(p) = self.probe {
            let d = &mut config.probe;
            d.ffprobe_path = p.ffprobe_path.unwrap_or(d.ffprobe_path.clone());
            d.timeout_secs = p.timeout_secs.unwrap_or(d.timeout_secs);
            d.cache_ttl_secs = p.cache_ttl_secs.unwrap_or(d.cache_ttl_secs);
            d.sweep_interval_secs = p.sweep_interval_secs.unwrap_or(d.sweep_interval_secs);
        }
        if let Some(t) = self.transcode {
            let d = &mut config.transcode;
            d.ffmpeg_path = t.ffmpeg_path.unwrap_or(d.ffmpeg_path.clone());
            d.timeout_secs = t.timeout_secs.unwrap_or(d.timeout_secs);
            d.scratch_dir = t.scratch_dir.or(d.scratch_dir.take());
            d.hwaccel_device = t.hwaccel_device.unwrap_or(d.hwaccel_device.clone());
        }
        if let Some(dl) = self.download {
            let d = &mut config.download;
            d.sendfile = dl.sendfile.unwrap_or(d.sendfile);
            d.sendfile_header = dl.sendfile_header.unwrap_or(d.sendfile_header.clone());
            d.sendfile_base = dl.sendfile_base.unwrap_or(d.sendfile_base.clone());
        }
        if let Some(l) = self.logging {
            config.logging.level = l.level.unwrap_or(config.logging.level);
            config.logging.format = l.format.unwrap_or(config.logging.format);
        }

        config
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
