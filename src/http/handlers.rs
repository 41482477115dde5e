//! HTTP request handlers
//!
//! Playlist, segment and media info endpoints plus the service endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use hls_transcode_lib::playlist::{self, encode_path, segment_url_template};
use hls_transcode_lib::{
    find_external_subtitles, resolve_selection, HlsError, QueryParams, StreamKind,
    TranscodeRequest,
};

use super::error::{HttpError, X_FFMPEG};
use crate::library::require_video;
use crate::state::AppState;

/// Non-standard length header some players read instead of Content-Length.
pub const CONTENT_SIZE: &str = "content-size";

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Debug endpoint - probe cache statistics
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.probe.cache().stats();
    Json(serde_json::json!({
        "entry_count": stats.entries,
        "oldest_entry_age_secs": stats.oldest_age_secs,
        "ttl_secs": stats.ttl_secs,
        "hits": stats.hits,
        "misses": stats.misses,
    }))
}

fn content_size(len: usize) -> HeaderValue {
    HeaderValue::from(len)
}

/// VOD playlist endpoint
/// GET /m3u8/{*path}
pub async fn vod_playlist(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Response, HttpError> {
    let media = state.library.open(&path).map_err(HttpError::playlist)?;
    require_video(&media.path).map_err(HttpError::playlist)?;
    let probe = state.probe.probe(&media).await.map_err(HttpError::playlist)?;

    let body = playlist::build(
        probe.duration,
        state.segment_length(),
        &segment_url_template(&path),
        &params,
    )
    .map_err(HttpError::playlist)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-mpegURL"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONTENT_SIZE, content_size(body.len()));

    Ok((headers, body).into_response())
}

/// Transcoded segment endpoint
/// GET /segments/{segment}/{*path}
pub async fn media_segment(
    State(state): State<Arc<AppState>>,
    Path((segment, path)): Path<(String, String)>,
    Query(params): Query<QueryParams>,
) -> Result<Response, HttpError> {
    let dev = state.is_dev();
    let index: usize = segment.parse().map_err(|_| {
        HttpError::not_found(format!("Missing or invalid segment index '{}'.", segment))
    })?;

    let media = state.library.open(&path)?;
    require_video(&media.path)?;
    let request = TranscodeRequest::from_query(&params)?;
    let probe = state.probe.probe(&media).await?;

    let external = match &request.external {
        Some(rel) => Some(
            state
                .library
                .resolve(rel)
                .map_err(|_| HlsError::ExternalSubtitleNotFound(rel.clone()))?,
        ),
        None => None,
    };
    let selection = resolve_selection(
        &probe,
        request.audio,
        request.subtitle,
        external.as_deref(),
    )?;

    let count = playlist::segments(probe.duration, state.segment_length())?.len();
    if index >= count {
        return Err(HttpError::not_found(format!(
            "Segment index '{}' is out of range, the media has {} segments.",
            index, count
        )));
    }

    let output = match state
        .transcoder
        .run(&media, &request, &selection, index, state.segment_length())
        .await
    {
        Ok(output) => output,
        Err(err) => {
            let command_line = err.command_line().map(str::to_string);
            let mut http = HttpError::from(err);
            if let (true, Some(cmd)) = (dev, command_line) {
                http = http.with_header(X_FFMPEG, &cmd);
            }
            return Err(http);
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mpegts"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    headers.insert(CONTENT_SIZE, content_size(output.data.len()));
    if dev {
        if let Ok(v) = HeaderValue::from_str(&output.command_line) {
            headers.insert(X_FFMPEG, v);
        }
    }

    Ok((headers, output.data).into_response())
}

/// Media summary endpoint
/// GET /info/{*path}
pub async fn media_info(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let media = state.library.open(&path)?;
    let mime = require_video(&media.path)?;
    let probe = state.probe.probe(&media).await?;

    let external: Vec<serde_json::Value> =
        find_external_subtitles(&media.path, &state.config.media.subtitle_extensions)?
            .into_iter()
            .map(|sub| {
                serde_json::json!({
                    "path": state.library.relative(&sub.path),
                    "language": sub.language,
                    "codec_name": sub.codec_name,
                    "codec_long_name": sub.codec_long_name,
                })
            })
            .collect();

    let encoded = encode_path(path.trim_start_matches('/'));
    Ok(Json(serde_json::json!({
        "path": state.library.relative(&media.path),
        "mimetype": mime,
        "size": media.size,
        "format": {
            "name": probe.format_name,
            "long_name": probe.format_long_name,
            "start_time": probe.start_time,
            "duration": probe.duration,
            "bit_rate": probe.bit_rate,
        },
        "video": probe.streams_of(StreamKind::Video).collect::<Vec<_>>(),
        "audio": probe.streams_of(StreamKind::Audio).collect::<Vec<_>>(),
        "subtitle": probe.streams_of(StreamKind::Subtitle).collect::<Vec<_>>(),
        "external_subtitles": external,
        "segment_duration": state.segment_length(),
        "segments": playlist::segments(probe.duration, state.segment_length())?.len(),
        "playlist_url": format!("/m3u8/{}", encoded),
        "download_url": format!("/download/{}", encoded),
    })))
}
