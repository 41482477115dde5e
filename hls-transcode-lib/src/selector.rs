//! Audio and subtitle track resolution
//!
//! Users pick tracks by local index (0-based within their kind). This module
//! checks the picks against the probe and decides how subtitles get onto the
//! picture.

use std::path::{Path, PathBuf};

use crate::error::{HlsError, Result};
use crate::types::{ProbeResult, StreamKind};

/// Subtitle codecs that are pictures and must be overlaid rather than rendered.
pub const BITMAP_SUBTITLE_CODECS: &[&str] =
    &["hdmv_pgs_subtitle", "dvd_subtitle", "dvb_subtitle", "xsub"];

pub fn is_bitmap_subtitle(codec: &str) -> bool {
    BITMAP_SUBTITLE_CODECS.contains(&codec)
}

/// How subtitles end up in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleMode {
    /// No subtitle stream mapped.
    None,
    /// Render an external subtitle file into the picture.
    External(PathBuf),
    /// Overlay a bitmap subtitle stream on the video.
    Overlay {
        container_index: usize,
        local_index: usize,
    },
    /// Render an internal text subtitle stream into the picture.
    BurnIn { local_index: usize },
}

/// Resolved track choice for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Audio local index; `None` when the file has no audio.
    pub audio: Option<usize>,
    pub subtitle: SubtitleMode,
}

/// The audio stream flagged default, else the first one.
pub fn default_audio(probe: &ProbeResult) -> Option<usize> {
    let mut audio = probe.streams_of(StreamKind::Audio).peekable();
    let first = audio.peek().map(|s| s.local_index)?;
    Some(
        audio
            .find(|s| s.default)
            .map(|s| s.local_index)
            .unwrap_or(first),
    )
}

/// Check requested tracks against the probe and pick a subtitle mode.
///
/// Checks run in order: external subtitle, internal subtitle, audio.
pub fn resolve(
    probe: &ProbeResult,
    audio: Option<usize>,
    subtitle: Option<usize>,
    external: Option<&Path>,
) -> Result<Selection> {
    if let Some(path) = external {
        if !path.is_file() {
            return Err(HlsError::ExternalSubtitleNotFound(
                path.display().to_string(),
            ));
        }
    }

    let internal = match subtitle {
        Some(idx) => Some(probe.stream(StreamKind::Subtitle, idx).ok_or_else(|| {
            HlsError::InvalidSubtitleSelector(format!(
                "Invalid subtitle stream id '{}' was given.",
                idx
            ))
        })?),
        None => None,
    };

    let audio = match audio {
        Some(idx) => {
            if probe.stream(StreamKind::Audio, idx).is_none() {
                return Err(HlsError::InvalidAudioSelector(format!(
                    "Invalid audio stream id '{}' was given.",
                    idx
                )));
            }
            Some(idx)
        }
        None => default_audio(probe),
    };

    let subtitle = match (external, internal) {
        (Some(path), _) => SubtitleMode::External(path.to_path_buf()),
        (None, Some(s)) if is_bitmap_subtitle(&s.codec_name) => SubtitleMode::Overlay {
            container_index: s.container_index,
            local_index: s.local_index,
        },
        (None, Some(s)) => SubtitleMode::BurnIn {
            local_index: s.local_index,
        },
        (None, None) => SubtitleMode::None,
    };

    Ok(Selection { audio, subtitle })
}
