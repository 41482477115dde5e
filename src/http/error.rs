//! HTTP error type
//!
//! Handlers return [`HttpError`]; its response carries an [`ErrorEnvelope`]
//! extension that the envelope middleware turns into an HTML or JSON body.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hls_transcode_lib::HlsError;

/// Diagnostic header carrying the transcoder command line in dev mode.
pub const X_FFMPEG: HeaderName = HeaderName::from_static("x-ffmpeg");

/// Marker left on error responses for the envelope middleware.
#[derive(Debug, Clone)]
pub struct ErrorEnvelope {
    pub message: String,
}

/// HTTP error
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
    pub headers: HeaderMap,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Add a response header. Values that are not valid header text are
    /// dropped.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(v) = HeaderValue::from_str(value) {
            self.headers.insert(name, v);
        }
        self
    }

    /// Playlist endpoint: every library failure is the client's problem.
    pub fn playlist(err: HlsError) -> Self {
        let status = match &err {
            HlsError::Io(_) | HlsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::logged(status, err)
    }

    fn logged(status: StatusCode, err: HlsError) -> Self {
        if status.is_server_error() {
            tracing::error!("request failed: {}", err);
        }
        Self::new(status, message_of(&err))
    }
}

/// User-facing text of a library error.
fn message_of(err: &HlsError) -> String {
    match err {
        HlsError::NotFound(m)
        | HlsError::BadRequest(m)
        | HlsError::ProbeFailure(m)
        | HlsError::UnsupportedMedia(m)
        | HlsError::InvalidAudioSelector(m)
        | HlsError::InvalidSubtitleSelector(m) => m.clone(),
        HlsError::ExternalSubtitleNotFound(p) => {
            format!("Invalid external subtitle file '{}' was given.", p)
        }
        HlsError::TranscodeFailure { detail, .. } => {
            if detail.is_empty() {
                "Failed to generate segment.".to_string()
            } else {
                format!("Failed to generate segment. '{}'.", detail)
            }
        }
        other => other.to_string(),
    }
}

impl From<HlsError> for HttpError {
    fn from(err: HlsError) -> Self {
        let status = match &err {
            HlsError::NotFound(_) | HlsError::ExternalSubtitleNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            HlsError::BadRequest(_)
            | HlsError::ProbeFailure(_)
            | HlsError::UnsupportedMedia(_)
            | HlsError::InvalidAudioSelector(_)
            | HlsError::InvalidSubtitleSelector(_) => StatusCode::BAD_REQUEST,
            HlsError::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            HlsError::TranscodeFailure { .. }
            | HlsError::TranscodeTimeout { .. }
            | HlsError::ScratchAlias(_)
            | HlsError::Io(_)
            | HlsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let unsatisfiable = match &err {
            HlsError::Unsatisfiable { size } => Some(*size),
            _ => None,
        };
        let http = Self::logged(status, err);
        match unsatisfiable {
            Some(size) => http.with_header(header::CONTENT_RANGE, &format!("bytes */{}", size)),
            None => http,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message.clone()).into_response();
        response.headers_mut().extend(self.headers);
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response.extensions_mut().insert(ErrorEnvelope {
            message: self.message,
        });
        response
    }
}
