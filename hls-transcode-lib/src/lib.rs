//! On-demand HLS engine.
//!
//! Probes local media with an external prober, builds VOD playlists of
//! fixed-length segments, transcodes each segment on request with an
//! external transcoder, and resolves HTTP byte ranges for direct download.

pub mod error;
pub mod playlist;
pub mod probe;
pub mod range;
pub mod runner;
pub mod selector;
pub mod transcode;
pub mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use error::{HlsError, Result};
pub use playlist::{QueryParams, SEGMENT_DURATION};
pub use probe::{find_external_subtitles, MediaProbe, ProbeCacheStats, DEFAULT_PROBE_TTL};
pub use range::resolve_range;
pub use runner::{
    Invocation, ProcessRunner, ScriptedRunner, ScriptedStep, ToolError, ToolOutput, ToolRunner,
};
pub use selector::{resolve as resolve_selection, Selection, SubtitleMode};
pub use transcode::{SegmentTranscoder, TranscodeOutput, TranscodeRequest, TranscoderSettings};
pub use types::*;
