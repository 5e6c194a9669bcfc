//! Hooks for `tower_http::trace::TraceLayer`.
//!
//! One span per request, the request line on entry, and the response status
//! with latency on exit, logged at a level that follows the status class.

use axum::http::{Request, Response};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tracing::{info_span, Span};

pub fn make_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri().path(),
        query = ?request.uri().query(),
        request_id = request_id,
        content_type = ?request.headers().get("content-type"),
        content_length = ?request.headers().get("content-length"),
    )
}

pub fn on_request<B>(request: &Request<B>, _span: &Span) {
    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok());

    tracing::info!(
        method = %request.method(),
        uri = %request.uri(),
        user_id = ?user_id,
        "Incoming HTTP request"
    );
}

pub fn on_response<B>(response: &Response<B>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    if status.is_server_error() {
        tracing::error!(status = %status, latency_ms, "HTTP request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(status = %status, latency_ms, "HTTP request completed with client error");
    } else {
        tracing::info!(status = %status, latency_ms, "HTTP request completed");
    }
}

pub fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    let error_type = match error {
        ServerErrorsFailureClass::StatusCode(code) => format!("HTTP {}", code.as_u16()),
        ServerErrorsFailureClass::Error(ref e) => format!("Internal Error: {}", e),
    };

    tracing::error!(
        latency_ms = latency.as_millis(),
        error_type = error_type,
        "HTTP request failed"
    );
}
