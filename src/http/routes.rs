//! Axum router configuration

use axum::{
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::download::download;
use super::handlers::{
    cache_stats, health_check, media_info, media_segment, version_check, vod_playlist,
};
use super::middleware::{error_envelope, handle_panic, request_logger};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Players load playlists and segments cross-origin; Safari also wants
    // private network access for LAN servers.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::RANGE,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::IF_MODIFIED_SINCE,
        ])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
        ])
        .allow_private_network(true)
        .max_age(Duration::from_secs(3600));

    Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Debug endpoints
        .route("/debug/cache", get(cache_stats))
        // Media endpoints
        .route("/m3u8/{*path}", get(vod_playlist))
        .route("/segments/{segment}/{*path}", get(media_segment))
        .route("/download/{*path}", get(download))
        .route("/info/{*path}", get(media_info))
        // Middleware, innermost first
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(error_envelope))
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}
