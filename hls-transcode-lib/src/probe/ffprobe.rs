//! ffprobe invocation and output decoding

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{HlsError, Result};
use crate::runner::Invocation;
use crate::types::{ProbeResult, Stream, StreamDetails, StreamKind};

/// Build the prober command for one file.
pub fn probe_invocation(ffprobe: &Path, media: &Path, timeout: Duration) -> Invocation {
    let mut inv = Invocation::new(ffprobe, timeout);
    inv.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]);
    inv.arg(format!("file:{}", media.to_string_lossy()));
    inv
}

/// Lower-case every object key, recursively.
pub fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    format: Option<RawFormat>,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_name: Option<String>,
    format_long_name: Option<String>,
    start_time: Option<Value>,
    duration: Option<Value>,
    size: Option<Value>,
    bit_rate: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    profile: Option<Value>,
    pix_fmt: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
    #[serde(default)]
    disposition: HashMap<String, Value>,
    #[serde(default)]
    tags: HashMap<String, Value>,
}

impl RawStream {
    fn flag(&self, name: &str) -> bool {
        self.disposition
            .get(name)
            .and_then(as_f64)
            .map(|v| v != 0.0)
            .unwrap_or(false)
    }

    fn tag(&self, name: &str) -> Option<String> {
        self.tags
            .get(name)
            .and_then(as_string)
            .filter(|s| !s.is_empty())
    }
}

// ffprobe prints most numbers as strings.
fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode prober stdout into a typed result.
pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeResult> {
    let value: Value = serde_json::from_slice(stdout)
        .map_err(|e| HlsError::ProbeFailure(format!("Malformed probe output: {}", e)))?;
    let raw: RawProbe = serde_json::from_value(lowercase_keys(value))
        .map_err(|e| HlsError::ProbeFailure(format!("Unexpected probe output: {}", e)))?;

    let format = raw
        .format
        .ok_or_else(|| HlsError::ProbeFailure("Probe output has no format section".into()))?;
    let duration = format
        .duration
        .as_ref()
        .and_then(as_f64)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| HlsError::ProbeFailure("Media duration is unknown".into()))?;

    let mut counters: HashMap<StreamKind, usize> = HashMap::new();
    let mut streams = Vec::with_capacity(raw.streams.len());
    for s in raw.streams {
        let kind = match s.codec_type.as_deref() {
            Some("video") => StreamKind::Video,
            Some("audio") => StreamKind::Audio,
            Some("subtitle") => StreamKind::Subtitle,
            _ => continue,
        };
        let counter = counters.entry(kind).or_insert(0);
        let local_index = *counter;
        *counter += 1;

        let details = match kind {
            StreamKind::Video => StreamDetails::Video {
                pix_fmt: s.pix_fmt.clone(),
                profile: s.profile.as_ref().and_then(as_string),
                width: s.width,
                height: s.height,
            },
            StreamKind::Audio => StreamDetails::Audio {
                channels: s.channels,
                language: s
                    .tag("language")
                    .unwrap_or_else(|| "und".to_string())
                    .to_uppercase(),
                title: s.tag("title"),
            },
            StreamKind::Subtitle => StreamDetails::Subtitle {
                language: s
                    .tag("language")
                    .unwrap_or_else(|| "und".to_string())
                    .to_lowercase(),
                title: s.tag("title"),
                forced: s.flag("forced"),
            },
        };

        streams.push(Stream {
            kind,
            container_index: s.index,
            local_index,
            codec_name: s.codec_name.clone().unwrap_or_default(),
            codec_long_name: s.codec_long_name.clone().unwrap_or_default(),
            default: s.flag("default"),
            details,
        });
    }

    Ok(ProbeResult {
        format_name: format.format_name.unwrap_or_default(),
        format_long_name: format.format_long_name.unwrap_or_default(),
        start_time: format.start_time.as_ref().and_then(as_f64).unwrap_or(0.0),
        duration,
        size: format.size.as_ref().and_then(as_u64).unwrap_or(0),
        bit_rate: format.bit_rate.as_ref().and_then(as_u64).unwrap_or(0),
        streams,
    })
}
