//! HTTP server module
//!
//! - Axum router with the playlist, segment, download and info endpoints
//! - Content-negotiated error envelopes
//! - CORS, tracing and panic recovery middleware

pub mod download;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
