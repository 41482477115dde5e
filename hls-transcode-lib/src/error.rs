use thiserror::Error;

/// Main error type for the HLS engine
#[derive(Error, Debug)]
pub enum HlsError {
    /// Media file (or another referenced file) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request parameter (selector, range, option value).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Requested byte range lies outside the file.
    #[error("Range not satisfiable for file of {size} bytes")]
    Unsatisfiable { size: u64 },

    /// The prober failed or produced output that could not be decoded.
    #[error("Probe failed: {0}")]
    ProbeFailure(String),

    /// File exists but is not a video.
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// The transcoder exited unsuccessfully.
    #[error("Transcode failed: {detail}")]
    TranscodeFailure {
        detail: String,
        command_line: String,
    },

    /// The transcoder ran past its deadline and was killed.
    #[error("Transcode timed out after {secs}s")]
    TranscodeTimeout { secs: u64, command_line: String },

    #[error("Invalid audio stream selector: {0}")]
    InvalidAudioSelector(String),

    #[error("Invalid subtitle stream selector: {0}")]
    InvalidSubtitleSelector(String),

    #[error("External subtitle not found: {0}")]
    ExternalSubtitleNotFound(String),

    /// A scratch alias for the transcoder input could not be created.
    #[error("Failed to create scratch alias: {0}")]
    ScratchAlias(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HlsError {
    /// Literal command line of the failed transcoder run, if any.
    pub fn command_line(&self) -> Option<&str> {
        match self {
            HlsError::TranscodeFailure { command_line, .. }
            | HlsError::TranscodeTimeout { command_line, .. } => Some(command_line),
            _ => None,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, HlsError>;
