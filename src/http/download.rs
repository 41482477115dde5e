//! Direct download endpoint
//!
//! Serves the original file, whole or by byte range, or hands the request to
//! the front-end proxy through an internal-redirect header.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::io::SeekFrom;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use hls_transcode_lib::playlist::encode_path;
use hls_transcode_lib::{resolve_range, HlsError, MediaFile};

use super::error::HttpError;
use crate::library::mime_type;
use crate::state::AppState;

/// One year, for responses the client may keep.
const LONG_CACHE: &str = "public, max-age=31536000";

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP date.
pub fn http_date(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).format(HTTP_DATE).to_string()
}

/// True when the client copy, dated by `If-Modified-Since`, is still current.
fn not_modified(headers: &HeaderMap, media: &MediaFile) -> bool {
    let Some(since) = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
    else {
        return false;
    };
    DateTime::<Utc>::from(media.modified).timestamp() <= since.timestamp()
}

fn disposition(media: &MediaFile) -> String {
    let name = media
        .path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_default();
    format!("inline; filename=\"{}\"", name)
}

fn insert(headers: &mut HeaderMap, name: impl Into<HeaderName>, value: &str) {
    if let Ok(v) = HeaderValue::from_str(value) {
        headers.insert(name.into(), v);
    }
}

/// Direct download endpoint
/// GET /download/{*path}
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    request_headers: HeaderMap,
) -> Result<Response, HttpError> {
    let media = state.library.open(&path)?;
    let last_modified = http_date(media.modified);

    if not_modified(&request_headers, &media) {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(LONG_CACHE));
        insert(&mut headers, header::LAST_MODIFIED, &last_modified);
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let mut headers = HeaderMap::new();
    insert(&mut headers, header::CONTENT_DISPOSITION, &disposition(&media));

    let download = &state.config.download;
    if download.sendfile {
        let header_name = HeaderName::from_bytes(download.sendfile_header.as_bytes())
            .map_err(|e| {
                HttpError::internal(format!(
                    "Invalid sendfile header '{}': {}",
                    download.sendfile_header, e
                ))
            })?;
        let target = format!(
            "{}{}",
            download.sendfile_base,
            encode_path(path.trim_start_matches('/'))
        );
        insert(&mut headers, header_name, &target);
        headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(LONG_CACHE));
        headers.insert(header::PRAGMA, HeaderValue::from_static("public"));
        tracing::debug!("delegating {} to proxy as {}", media.path.display(), target);
        return Ok((StatusCode::OK, headers).into_response());
    }

    let range_header = request_headers
        .get(header::RANGE)
        .map(|v| {
            v.to_str()
                .map_err(|_| HttpError::bad_request("Invalid Range header."))
        })
        .transpose()?;
    let range = resolve_range(range_header, media.size)?;

    let mut file = tokio::fs::File::open(&media.path)
        .await
        .map_err(HlsError::from)?;
    if range.start > 0 {
        file.seek(SeekFrom::Start(range.start))
            .await
            .map_err(HlsError::from)?;
    }
    let body = Body::from_stream(ReaderStream::new(file.take(range.len())));

    insert(&mut headers, header::CONTENT_TYPE, mime_type(&media.path));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len()));
    insert(&mut headers, header::LAST_MODIFIED, &last_modified);

    let status = if range.partial {
        insert(&mut headers, header::CONTENT_RANGE, &range.content_range());
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    Ok((status, headers, body).into_response())
}
