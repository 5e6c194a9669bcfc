//! HTTP surface for the video catalogue and the upload URL issuer.

pub mod common;
pub mod upload;
pub mod videos;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::convert::Infallible;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::api::common::{cors_layer, method_not_allowed};
use crate::InnerState;

/// JSON bodies for the catalogue are a handful of short strings.
pub const VIDEO_BODY_LIMIT: usize = 64 * 1024;

/// Creates the router serving `/videos` and `/upload`, with CORS, body
/// limits, panic recovery and request tracing applied.
#[tracing::instrument(name = "create_api_router", skip(state))]
pub fn create_api_router(state: InnerState) -> Router {
    tracing::info!("Creating API router");

    let upload_limit = state.settings.max_upload_bytes;

    Router::new()
        .route(
            "/videos",
            guarded(
                get(videos::get_videos)
                    .head(method_not_allowed)
                    .post(videos::create_video)
                    .put(videos::replace_video)
                    .delete(videos::delete_video)
                    .fallback(method_not_allowed),
                VIDEO_BODY_LIMIT,
                [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS],
            ),
        )
        .route(
            "/upload",
            guarded(
                post(upload::upload_file).fallback(method_not_allowed),
                upload_limit,
                [Method::POST, Method::OPTIONS],
            ),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(common::tracing::make_span::<Body>)
                .on_request(common::tracing::on_request::<Body>)
                .on_response(common::tracing::on_response::<Body>)
                .on_failure(common::tracing::on_failure),
        )
        .with_state(state)
}

/// Wraps a route so that every response, panics and extractor rejections
/// included, passes through its CORS policy.
fn guarded<const N: usize>(
    route: MethodRouter<InnerState>,
    body_limit: usize,
    methods: [Method; N],
) -> MethodRouter<InnerState> {
    route
        .layer::<_, Infallible>(DefaultBodyLimit::max(body_limit))
        .layer::<_, Infallible>(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(methods))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
