//! Encode parameters parsed from request query strings

use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{HlsError, Result};

/// Video codec that switches on VA-API decoding.
pub const HWACCEL_VIDEO_CODEC: &str = "h264_vaapi";

/// Codec value that copies the stream unchanged.
pub const PASSTHROUGH: &str = "copy";

/// Resolved encode parameters for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRequest {
    pub video_codec: String,
    pub video_crf: u32,
    pub video_preset: String,
    pub video_level: String,
    pub video_profile: String,
    /// `None` leaves the bitrate to the encoder.
    pub video_bitrate: Option<String>,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub audio_sampling_rate: u32,
    pub audio_channels: u32,
    /// Requested audio local index.
    pub audio: Option<usize>,
    /// Requested subtitle local index.
    pub subtitle: Option<usize>,
    /// External subtitle path, relative to the media library.
    pub external: Option<String>,
    /// Exact length of the final segment.
    pub explicit_duration: Option<f64>,
}

impl Default for TranscodeRequest {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            video_crf: 23,
            video_preset: "fast".to_string(),
            video_level: "4.1".to_string(),
            video_profile: "main".to_string(),
            video_bitrate: None,
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            audio_sampling_rate: 22050,
            audio_channels: 2,
            audio: None,
            subtitle: None,
            external: None,
            explicit_duration: None,
        }
    }
}

/// Codec, preset, level and profile names are passed to the transcoder verbatim.
fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:+]+$").expect("valid regex"))
}

fn token(name: &str, value: &str) -> Result<String> {
    if token_pattern().is_match(value) {
        Ok(value.to_string())
    } else {
        Err(HlsError::BadRequest(format!(
            "Invalid value '{}' for '{}'.",
            value, name
        )))
    }
}

fn number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        HlsError::BadRequest(format!("Invalid number '{}' for '{}'.", value, name))
    })
}

// A bitrate whose leading number is zero (or missing) means "unset".
fn bitrate_is_set(value: &str) -> bool {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().map(|n| n != 0).unwrap_or(false)
}

impl TranscodeRequest {
    /// Parse from query parameters. Unknown keys are ignored, empty values
    /// count as absent.
    pub fn from_query(params: &[(String, String)]) -> Result<Self> {
        let mut req = Self::default();
        for (key, value) in params {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "video_codec" => req.video_codec = token(key, value)?,
                "video_crf" => req.video_crf = number(key, value)?,
                "video_preset" => req.video_preset = token(key, value)?,
                "video_level" => req.video_level = token(key, value)?,
                "video_profile" => req.video_profile = token(key, value)?,
                "video_bitrate" => {
                    let value = token(key, value)?;
                    req.video_bitrate = bitrate_is_set(&value).then_some(value);
                }
                "audio_codec" => req.audio_codec = token(key, value)?,
                "audio_bitrate" => req.audio_bitrate = token(key, value)?,
                "audio_sampling_rate" => req.audio_sampling_rate = number(key, value)?,
                "audio_channels" => req.audio_channels = number(key, value)?,
                "audio" => req.audio = Some(number(key, value)?),
                "subtitle" => req.subtitle = Some(number(key, value)?),
                "external" => req.external = Some(value.clone()),
                "sd" => {
                    let sd: f64 = number(key, value)?;
                    if !sd.is_finite() || sd <= 0.0 {
                        return Err(HlsError::BadRequest(format!(
                            "Invalid segment duration '{}'.",
                            value
                        )));
                    }
                    req.explicit_duration = Some(sd);
                }
                _ => {}
            }
        }
        Ok(req)
    }

    pub fn hwaccel(&self) -> bool {
        self.video_codec == HWACCEL_VIDEO_CODEC
    }

    pub fn copies_video(&self) -> bool {
        self.video_codec == PASSTHROUGH
    }

    pub fn copies_audio(&self) -> bool {
        self.audio_codec == PASSTHROUGH
    }
}
