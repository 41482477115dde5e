//! Test fixtures for integration tests
//!
//! A temporary media library and a router whose external tools are scripted,
//! so requests run end to end without ffmpeg.

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

use hls_transcode_lib::{ScriptedRunner, ScriptedStep};

use crate::config::{Environment, ServerConfig};
use crate::http::create_router;
use crate::state::AppState;

/// Prober output for `movies/movie.mkv`: 13 seconds, one video, two audio
/// tracks and a text subtitle.
pub const PROBE_JSON: &str = r#"{
    "streams": [
        {"index": 0, "codec_name": "h264", "codec_long_name": "H.264 / AVC / MPEG-4 AVC",
         "codec_type": "video", "width": 1280, "height": 720, "pix_fmt": "yuv420p",
         "disposition": {"default": 1, "forced": 0}},
        {"index": 1, "codec_name": "aac", "codec_long_name": "AAC (Advanced Audio Coding)",
         "codec_type": "audio", "channels": 2,
         "disposition": {"default": 1, "forced": 0}, "tags": {"language": "eng"}},
        {"index": 2, "codec_name": "ac3", "codec_long_name": "ATSC A/52A (AC-3)",
         "codec_type": "audio", "channels": 6,
         "disposition": {"default": 0, "forced": 0}, "tags": {"language": "fre"}},
        {"index": 3, "codec_name": "subrip", "codec_long_name": "SubRip subtitle",
         "codec_type": "subtitle",
         "disposition": {"default": 0, "forced": 0}, "tags": {"language": "eng"}}
    ],
    "format": {
        "format_name": "matroska,webm",
        "format_long_name": "Matroska / WebM",
        "start_time": "0.000000",
        "duration": "13.000000",
        "size": "1000",
        "bit_rate": "615384"
    }
}"#;

/// Stand-in transcoder output.
pub const TS_BYTES: &[u8] = b"\x47\x40\x00\x10segment";

/// Bytes of `movies/movie.mkv`.
pub fn movie_bytes() -> Vec<u8> {
    (0..1000u32).map(|i| (i % 251) as u8).collect()
}

/// Router over a temporary library, plus handles to inspect it.
pub struct TestServer {
    pub dir: TempDir,
    pub runner: Arc<ScriptedRunner>,
    pub router: Router,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn dev() -> Self {
        Self::with_config(|c| c.environment = Environment::Dev)
    }

    /// Library layout:
    /// `movies/movie.mkv`, `movies/movie.en.srt`, `movies/notes.txt`, and
    /// an empty `scratch/` used for transcoder aliases.
    pub fn with_config(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let media = dir.path().join("media");
        std::fs::create_dir_all(media.join("movies")).expect("media dir");
        std::fs::create_dir_all(dir.path().join("scratch")).expect("scratch dir");
        std::fs::write(media.join("movies/movie.mkv"), movie_bytes()).expect("movie");
        std::fs::write(
            media.join("movies/movie.en.srt"),
            "1\n00:00:01,000 --> 00:00:02,000\nHello\n",
        )
        .expect("srt");
        std::fs::write(media.join("movies/notes.txt"), "notes").expect("notes");

        let mut config = ServerConfig::default();
        config.media.media_path = Some(media);
        config.transcode.scratch_dir = Some(dir.path().join("scratch"));
        adjust(&mut config);

        let runner = Arc::new(ScriptedRunner::new(ScriptedStep::ok(TS_BYTES)));
        let state = AppState::new(config, runner.clone()).expect("state");
        let router = create_router(Arc::new(state));

        Self {
            dir,
            runner,
            router,
        }
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    /// Queue the prober answer for the next probe.
    pub fn expect_probe(&self) {
        self.runner.push(ScriptedStep::ok(PROBE_JSON));
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.get_with(uri, &[]).await
    }

    pub async fn get_with(&self, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
        let mut builder = Request::builder()
            .uri(uri)
            .header(header::ORIGIN, "http://player.example");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).expect("request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible")
    }
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("utf-8 body")
}

/// Header value as text, if present.
pub fn header_str<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
