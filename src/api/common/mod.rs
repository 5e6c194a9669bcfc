//! Response conventions shared by the video and upload handlers.
//!
//! CORS is answered by a `CorsLayer` per route: every response carries
//! `Access-Control-Allow-Origin: *`, and any `OPTIONS` request gets an empty
//! 200 listing the methods that route accepts.

pub mod tracing;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::errors::AppError;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// CORS policy for a route serving `methods`.
pub fn cors_layer<const N: usize>(methods: [Method; N]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, X_USER_ID])
        .max_age(PREFLIGHT_MAX_AGE)
}

pub fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

/// Method-router fallback for verbs a handler does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Parses a JSON request body, reading an empty body as `{}`.
pub fn parse_json_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}
