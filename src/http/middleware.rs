//! HTTP middleware
//!
//! Request logging, content-negotiated error bodies and panic recovery.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::time::Instant;
use tracing::{error, info, warn};

use super::error::{ErrorEnvelope, HttpError};

/// Request logging middleware
pub async fn request_logger(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        error!("{} {} {} in {:?}", method, uri, status, duration);
    } else if status.is_client_error() {
        warn!("{} {} {} in {:?}", method, uri, status, duration);
    } else {
        info!("{} {} {} in {:?}", method, uri, status, duration);
    }

    response
}

/// Rewrite error bodies as JSON or HTML depending on `Accept`.
///
/// Only responses built from [`HttpError`] are touched; everything else
/// passes through.
pub async fn error_envelope(request: Request<Body>, next: Next) -> Response {
    let wants_json = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    let mut response = next.run(request).await;
    let Some(envelope) = response.extensions_mut().remove::<ErrorEnvelope>() else {
        return response;
    };

    let status = response.status();
    let (content_type, body) = if wants_json {
        let body = serde_json::json!({
            "type": "error",
            "message": envelope.message,
            "code": status.as_u16(),
        });
        ("application/json", body.to_string())
    } else {
        ("text/html; charset=utf-8", render_html(status.as_u16(), &envelope.message))
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    Response::from_parts(parts, Body::from(body))
}

fn render_html(code: u16, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Error {code}</title></head>\n\
         <body><h1>Error {code}</h1><p>{}</p></body></html>\n",
        escape_html(message)
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Turn a handler panic into a plain 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("handler panicked: {}", detail);
    HttpError::internal("Internal server error.").into_response()
}
