use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{HlsError, Result};

/// A media file on disk. Identity is the path; `modified` is part of the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl MediaFile {
    /// Stat a regular file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)
            .map_err(|_| HlsError::NotFound(path.display().to_string()))?;
        if !meta.is_file() {
            return Err(HlsError::NotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            size: meta.len(),
            modified: meta.modified()?,
        })
    }

    /// Modification time as nanoseconds since the epoch (0 if before it).
    pub fn mtime_nanos(&self) -> u128 {
        self.modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    }
}

/// Stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

/// Type-specific stream attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamDetails {
    Video {
        pix_fmt: Option<String>,
        profile: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    },
    Audio {
        channels: Option<u32>,
        language: String,
        title: Option<String>,
    },
    Subtitle {
        language: String,
        title: Option<String>,
        forced: bool,
    },
}

/// One elementary stream of a probed container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stream {
    pub kind: StreamKind,
    /// Position in the container. Used for filter-graph references.
    pub container_index: usize,
    /// 0-based position among streams of the same kind. Users select by this.
    pub local_index: usize,
    pub codec_name: String,
    pub codec_long_name: String,
    pub default: bool,
    pub details: StreamDetails,
}

impl Stream {
    /// Language tag, for audio and subtitle streams.
    pub fn language(&self) -> Option<&str> {
        match &self.details {
            StreamDetails::Audio { language, .. } | StreamDetails::Subtitle { language, .. } => {
                Some(language)
            }
            StreamDetails::Video { .. } => None,
        }
    }
}

/// Container and stream metadata of a media file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub format_name: String,
    pub format_long_name: String,
    pub start_time: f64,
    /// Seconds, fractional.
    pub duration: f64,
    pub size: u64,
    pub bit_rate: u64,
    /// In container order.
    pub streams: Vec<Stream>,
}

impl ProbeResult {
    /// Streams of one kind, in container order.
    pub fn streams_of(&self, kind: StreamKind) -> impl Iterator<Item = &Stream> {
        self.streams.iter().filter(move |s| s.kind == kind)
    }

    /// Look up a stream by kind and local index.
    pub fn stream(&self, kind: StreamKind, local_index: usize) -> Option<&Stream> {
        self.streams_of(kind).find(|s| s.local_index == local_index)
    }
}

/// A subtitle file next to the media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalSubtitle {
    pub path: PathBuf,
    pub language: String,
    /// File extension, lower-cased.
    pub codec_name: String,
    pub codec_long_name: String,
}

/// One playlist entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDescriptor {
    pub index: usize,
    pub start: f64,
    pub duration: f64,
}

/// Resolved byte window of a download request. `end` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
    pub partial: bool,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value for a `Content-Range` header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}
