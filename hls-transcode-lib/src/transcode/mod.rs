//! Per-segment transcoding
//!
//! Each request creates scratch aliases for its inputs, runs the transcoder
//! once under a deadline and returns the MPEG-TS bytes from stdout. The
//! aliases are removed on every exit path, including cancellation.

pub mod command;
pub mod options;
pub mod scratch;

pub use command::{build_args, InputAliases, SegmentWindow};
pub use options::TranscodeRequest;
pub use scratch::ScratchAlias;

use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{HlsError, Result};
use crate::runner::{Invocation, ToolError, ToolRunner};
use crate::selector::{Selection, SubtitleMode};
use crate::types::MediaFile;
use scratch::{SUBTITLE_ALIAS_PREFIX, VIDEO_ALIAS_PREFIX};

/// Transcoder settings
#[derive(Debug, Clone)]
pub struct TranscoderSettings {
    /// Transcoder executable
    pub ffmpeg: PathBuf,
    /// Wall-clock limit per segment
    pub timeout: Duration,
    /// Directory for input aliases
    pub scratch_dir: PathBuf,
    /// Render node used for hardware decoding
    pub hwaccel_device: String,
}

impl Default for TranscoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            timeout: Duration::from_secs(120),
            scratch_dir: std::env::temp_dir(),
            hwaccel_device: "/dev/dri/renderD128".to_string(),
        }
    }
}

/// Result of a successful transcode.
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    pub data: Bytes,
    /// Literal command line, for diagnostics.
    pub command_line: String,
}

/// Runs the transcoder for one segment at a time.
pub struct SegmentTranscoder {
    runner: Arc<dyn ToolRunner>,
    settings: TranscoderSettings,
}

impl SegmentTranscoder {
    pub fn new(runner: Arc<dyn ToolRunner>, settings: TranscoderSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &TranscoderSettings {
        &self.settings
    }

    /// Build the invocation for one segment given already-created aliases.
    pub fn invocation(
        &self,
        request: &TranscodeRequest,
        selection: &Selection,
        window: SegmentWindow,
        aliases: InputAliases<'_>,
    ) -> Invocation {
        let mut invocation = Invocation::new(&self.settings.ffmpeg, self.settings.timeout);
        invocation.args(build_args(
            request,
            selection,
            window,
            aliases,
            &self.settings.hwaccel_device,
        ));
        invocation
    }

    /// Transcode segment `segment_index` of `media`.
    pub async fn run(
        &self,
        media: &MediaFile,
        request: &TranscodeRequest,
        selection: &Selection,
        segment_index: usize,
        segment_length: f64,
    ) -> Result<TranscodeOutput> {
        let window = SegmentWindow::new(segment_index, segment_length, request.explicit_duration)?;

        let video_alias =
            ScratchAlias::create(&self.settings.scratch_dir, VIDEO_ALIAS_PREFIX, &media.path)?;
        let subtitle_alias = match &selection.subtitle {
            SubtitleMode::External(path) => Some(ScratchAlias::create(
                &self.settings.scratch_dir,
                SUBTITLE_ALIAS_PREFIX,
                path,
            )?),
            _ => None,
        };

        let invocation = self.invocation(
            request,
            selection,
            window,
            InputAliases {
                video: video_alias.path(),
                subtitle: subtitle_alias.as_ref().map(|a| a.path()),
            },
        );
        let command_line = invocation.command_line();
        debug!("transcoding: {}", command_line);

        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(ToolError::Timeout { timeout, .. }) => {
                warn!(
                    "segment {} of {} timed out",
                    segment_index,
                    media.path.display()
                );
                return Err(HlsError::TranscodeTimeout {
                    secs: timeout.as_secs(),
                    command_line,
                });
            }
            Err(e) => {
                return Err(HlsError::TranscodeFailure {
                    detail: e.to_string(),
                    command_line,
                })
            }
        };

        if !output.success {
            return Err(HlsError::TranscodeFailure {
                detail: output.diagnostic(),
                command_line,
            });
        }

        info!(
            "segment {} of {}: {} bytes",
            segment_index,
            media.path.display(),
            output.stdout.len()
        );
        Ok(TranscodeOutput {
            data: Bytes::from(output.stdout),
            command_line,
        })
    }
}
