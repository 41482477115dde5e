//! End-to-end integration tests

use axum::http::StatusCode;

use hls_transcode_lib::ScriptedStep;

use super::fixtures::{
    body_bytes, body_string, header_str, movie_bytes, TestServer, TS_BYTES,
};

const MOVIE: &str = "movies/movie.mkv";

fn scratch_is_empty(server: &TestServer) -> bool {
    std::fs::read_dir(server.scratch_dir()).unwrap().next().is_none()
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap()
}

// Playlist

#[tokio::test]
async fn test_playlist() {
    let server = TestServer::new();
    server.expect_probe();

    let response = server
        .get(&format!("/m3u8/{}?audio=1&sd=3", MOVIE))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, "content-type"),
        Some("application/x-mpegURL")
    );
    assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
    let size: usize = header_str(&response, "content-size").unwrap().parse().unwrap();

    let body = body_string(response).await;
    assert_eq!(size, body.len());
    assert!(body.starts_with("#EXTM3U\n"));
    assert!(body.contains("#EXT-X-TARGETDURATION:6\n"));
    assert!(body.ends_with("#EXT-X-ENDLIST\n"));

    let urls: Vec<&str> = body.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(
        urls,
        vec![
            "/segments/0/movies/movie.mkv?audio=1",
            "/segments/1/movies/movie.mkv?audio=1",
            "/segments/2/movies/movie.mkv?audio=1&sd=1.000000",
        ]
    );
    assert_eq!(server.runner.call_count(), 1);
}

#[tokio::test]
async fn test_playlist_probe_is_cached() {
    let server = TestServer::new();
    server.expect_probe();

    for _ in 0..3 {
        let response = server.get(&format!("/m3u8/{}", MOVIE)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(server.runner.call_count(), 1);

    let response = server.get("/debug/cache").await;
    let stats = json(&body_string(response).await);
    assert_eq!(stats["entry_count"], 1);
    assert_eq!(stats["hits"], 2);
}

#[tokio::test]
async fn test_concurrent_playlists_share_probe() {
    let server = TestServer::new();
    server.expect_probe();

    let uri = format!("/m3u8/{}", MOVIE);
    let (a, b) = tokio::join!(server.get(&uri), server.get(&uri));
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    assert_eq!(server.runner.call_count(), 1);
}

#[tokio::test]
async fn test_playlist_missing_file_json() {
    let server = TestServer::new();

    let response = server
        .get_with("/m3u8/movies/none.mkv", &[("accept", "application/json")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header_str(&response, "content-type"), Some("application/json"));
    assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));

    let body = json(&body_string(response).await);
    assert_eq!(body["type"], "error");
    assert_eq!(body["code"], 400);
    assert_eq!(
        body["message"],
        "Invalid path was given. 'movies/none.mkv'."
    );
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_playlist_not_video_html() {
    let server = TestServer::new();

    let response = server.get("/m3u8/movies/notes.txt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(header_str(&response, "content-type")
        .unwrap()
        .starts_with("text/html"));
    let body = body_string(response).await;
    assert!(body.contains("Unable to analyze file 'notes.txt' as it has 'text/plain' mimetype."));
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_playlist_traversal_rejected() {
    let server = TestServer::new();
    let response = server.get("/m3u8/movies/../../secret.mkv").await;
    assert_ne!(response.status(), StatusCode::OK);
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_playlist_probe_failure() {
    let server = TestServer::new();
    server
        .runner
        .push(ScriptedStep::fail("moov atom not found"));

    let response = server
        .get_with(&format!("/m3u8/{}", MOVIE), &[("accept", "application/json")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(&body_string(response).await);
    assert_eq!(body["message"], "Failed - moov atom not found");
}

// Segments

#[tokio::test]
async fn test_segment_dev() {
    let server = TestServer::dev();
    server.expect_probe();

    let response = server
        .get(&format!("/segments/1/{}?audio=1", MOVIE))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "content-type"), Some("video/mpegts"));
    assert_eq!(header_str(&response, "cache-control"), Some("no-cache"));
    assert_eq!(header_str(&response, "x-accel-buffering"), Some("no"));
    assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
    assert_eq!(
        header_str(&response, "content-size"),
        Some(TS_BYTES.len().to_string().as_str())
    );

    let command = header_str(&response, "x-ffmpeg").unwrap().to_string();
    assert!(command.starts_with("ffmpeg -xerror"));
    assert!(command.contains("-ss 6.000000 -t 6.000000"));
    assert!(command.contains("-map 0:a:1"));
    assert!(command.contains("-sn -muxdelay 0 -f mpegts pipe:1"));
    assert!(command.contains(&server.scratch_dir().display().to_string()));

    assert_eq!(body_bytes(response).await, TS_BYTES);
    assert_eq!(server.runner.call_count(), 2);
    assert!(scratch_is_empty(&server));
}

#[tokio::test]
async fn test_segment_production_hides_command() {
    let server = TestServer::new();
    server.expect_probe();

    let response = server.get(&format!("/segments/0/{}", MOVIE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-ffmpeg").is_none());
}

#[tokio::test]
async fn test_final_segment_uses_explicit_duration() {
    let server = TestServer::dev();
    server.expect_probe();

    let response = server
        .get(&format!("/segments/2/{}?sd=1.000000", MOVIE))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let command = header_str(&response, "x-ffmpeg").unwrap();
    assert!(command.contains("-ss 12.000000 -t 1.000000"));
}

#[tokio::test]
async fn test_segment_not_video() {
    let server = TestServer::new();

    let response = server.get("/segments/0/movies/notes.txt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("Unable to analyze file 'notes.txt' as it has 'text/plain' mimetype."));
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_segment_invalid_index() {
    let server = TestServer::new();

    let response = server
        .get_with(
            &format!("/segments/abc/{}", MOVIE),
            &[("accept", "application/json")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json(&body_string(response).await);
    assert_eq!(body["message"], "Missing or invalid segment index 'abc'.");
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_segment_out_of_range() {
    let server = TestServer::new();
    server.expect_probe();

    let response = server.get(&format!("/segments/3/{}", MOVIE)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.runner.call_count(), 1);
}

#[tokio::test]
async fn test_segment_missing_media() {
    let server = TestServer::new();
    let response = server.get("/segments/0/movies/none.mkv").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_segment_invalid_audio() {
    let server = TestServer::new();
    server.expect_probe();

    let response = server
        .get_with(
            &format!("/segments/0/{}?audio=5", MOVIE),
            &[("accept", "application/json")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(&body_string(response).await);
    assert_eq!(body["message"], "Invalid audio stream id '5' was given.");
    // Probe only, no transcode
    assert_eq!(server.runner.call_count(), 1);
}

#[tokio::test]
async fn test_segment_invalid_subtitle() {
    let server = TestServer::new();
    server.expect_probe();

    let response = server
        .get(&format!("/segments/0/{}?subtitle=1", MOVIE))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.runner.call_count(), 1);
}

#[tokio::test]
async fn test_segment_bad_option() {
    let server = TestServer::new();

    let response = server
        .get(&format!("/segments/0/{}?video_crf=high", MOVIE))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_segment_external_subtitle() {
    let server = TestServer::dev();
    server.expect_probe();

    let response = server
        .get(&format!(
            "/segments/0/{}?external=movies/movie.en.srt",
            MOVIE
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let command = header_str(&response, "x-ffmpeg").unwrap();
    assert!(command.contains("-vf subtitles="));
    assert!(command.contains("ffmpeg-external-sub-"));
    assert!(scratch_is_empty(&server));
}

#[tokio::test]
async fn test_segment_external_subtitle_missing() {
    let server = TestServer::new();
    server.expect_probe();

    for external in ["movies/none.srt", "../outside.srt"] {
        let response = server
            .get(&format!("/segments/0/{}?external={}", MOVIE, external))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", external);
    }
    assert_eq!(server.runner.call_count(), 1);
}

#[tokio::test]
async fn test_segment_transcode_failure() {
    let server = TestServer::dev();
    server.expect_probe();
    server
        .runner
        .push(ScriptedStep::fail("Invalid data found when processing input"));

    let response = server
        .get_with(
            &format!("/segments/0/{}", MOVIE),
            &[("accept", "application/json")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
    assert!(header_str(&response, "x-ffmpeg")
        .unwrap()
        .starts_with("ffmpeg "));

    let body = json(&body_string(response).await);
    assert_eq!(body["code"], 500);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Invalid data found when processing input"));
    assert!(scratch_is_empty(&server));
}

#[tokio::test]
async fn test_segment_transcode_timeout() {
    let server = TestServer::new();
    server.expect_probe();
    server.runner.push(ScriptedStep::Timeout);

    let response = server.get(&format!("/segments/0/{}", MOVIE)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get("x-ffmpeg").is_none());
    assert!(scratch_is_empty(&server));
}

// Downloads

#[tokio::test]
async fn test_download_full() {
    let server = TestServer::new();

    let response = server.get(&format!("/download/{}", MOVIE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "content-type"), Some("video/x-matroska"));
    assert_eq!(header_str(&response, "content-length"), Some("1000"));
    assert_eq!(header_str(&response, "accept-ranges"), Some("bytes"));
    assert_eq!(
        header_str(&response, "content-disposition"),
        Some("inline; filename=\"movie.mkv\"")
    );
    assert!(response.headers().get("content-range").is_none());
    assert!(response.headers().get("last-modified").is_some());
    assert_eq!(body_bytes(response).await, movie_bytes());
    assert_eq!(server.runner.call_count(), 0);
}

#[tokio::test]
async fn test_download_ranges() {
    let server = TestServer::new();
    let data = movie_bytes();
    let uri = format!("/download/{}", MOVIE);

    let cases: [(&str, &str, std::ops::Range<usize>); 3] = [
        ("bytes=100-199", "bytes 100-199/1000", 100..200),
        ("bytes=-100", "bytes 900-999/1000", 900..1000),
        ("bytes=900-2000", "bytes 900-999/1000", 900..1000),
    ];
    for (range, content_range, slice) in cases {
        let response = server.get_with(&uri, &[("range", range)]).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT, "{}", range);
        assert_eq!(header_str(&response, "content-range"), Some(content_range));
        assert_eq!(
            header_str(&response, "content-length"),
            Some(slice.len().to_string().as_str())
        );
        assert_eq!(body_bytes(response).await, &data[slice]);
    }
}

#[tokio::test]
async fn test_download_unsatisfiable() {
    let server = TestServer::new();
    let uri = format!("/download/{}", MOVIE);

    for range in ["bytes=0-0,100-200", "bytes=995-990", "bytes=1000-"] {
        let response = server.get_with(&uri, &[("range", range)]).await;
        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "{}",
            range
        );
        assert_eq!(header_str(&response, "content-range"), Some("bytes */1000"));
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some("*"));
    }
}

#[tokio::test]
async fn test_download_malformed_range() {
    let server = TestServer::new();
    let response = server
        .get_with(&format!("/download/{}", MOVIE), &[("range", "items=0-1")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_if_modified_since() {
    let server = TestServer::new();
    let uri = format!("/download/{}", MOVIE);

    let response = server
        .get_with(&uri, &[("if-modified-since", "Fri, 01 Jan 2100 00:00:00 GMT")])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(
        header_str(&response, "cache-control"),
        Some("public, max-age=31536000")
    );
    assert!(body_bytes(response).await.is_empty());

    let response = server
        .get_with(&uri, &[("if-modified-since", "Thu, 01 Jan 1970 00:00:00 GMT")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_download_sendfile() {
    let server = TestServer::with_config(|c| {
        c.download.sendfile = true;
        c.download.sendfile_base = "/protected/".to_string();
    });

    let response = server.get(&format!("/download/{}", MOVIE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, "x-accel-redirect"),
        Some("/protected/movies/movie.mkv")
    );
    assert_eq!(
        header_str(&response, "content-disposition"),
        Some("inline; filename=\"movie.mkv\"")
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_download_missing() {
    let server = TestServer::new();
    let response = server.get("/download/movies/none.mkv").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// Info and service endpoints

#[tokio::test]
async fn test_media_info() {
    let server = TestServer::new();
    server.expect_probe();

    let response = server.get(&format!("/info/{}", MOVIE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let info = json(&body_string(response).await);

    assert_eq!(info["path"], MOVIE);
    assert_eq!(info["mimetype"], "video/x-matroska");
    assert_eq!(info["format"]["duration"], 13.0);
    assert_eq!(info["video"].as_array().unwrap().len(), 1);
    assert_eq!(info["audio"].as_array().unwrap().len(), 2);
    assert_eq!(info["audio"][1]["local_index"], 1);
    assert_eq!(info["subtitle"].as_array().unwrap().len(), 1);
    assert_eq!(info["segments"], 3);

    let external = info["external_subtitles"].as_array().unwrap();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0]["path"], "movies/movie.en.srt");
    assert_eq!(external[0]["language"], "en");

    assert_eq!(info["playlist_url"], "/m3u8/movies/movie.mkv");
    assert_eq!(info["download_url"], "/download/movies/movie.mkv");
}

#[tokio::test]
async fn test_service_endpoints() {
    let server = TestServer::new();

    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");

    let response = server.get("/version").await;
    let version = json(&body_string(response).await);
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}
