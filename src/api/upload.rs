//! Upload endpoint.
//!
//! Nothing is written to storage: the handler only mints an identifier and
//! returns the URL the file is expected to live at. Clients paste that URL
//! into a video's `video_url` or `thumbnail_url`.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use base64::engine::general_purpose;
use base64::Engine;
use serde::Serialize;
use uuid::Uuid;

use crate::api::common::json_response;
use crate::errors::AppError;
use crate::InnerState;

const IMAGE_EXTENSION: &str = ".jpg";
const VIDEO_EXTENSION: &str = ".mp4";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_id: String,
}

/// Picks `.jpg` for anything declared as an image and `.mp4` otherwise.
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.contains("image") => IMAGE_EXTENSION,
        _ => VIDEO_EXTENSION,
    }
}

/// True when the client marked the body as base64 text.
fn is_base64_encoded(headers: &HeaderMap) -> bool {
    headers
        .get("content-transfer-encoding")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"))
}

pub fn decode_payload(body: Bytes, base64_encoded: bool) -> Result<Bytes, AppError> {
    if !base64_encoded {
        return Ok(body);
    }
    // Line-wrapped base64 is common from clients; whitespace carries no data.
    let text: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(Bytes::from(general_purpose::STANDARD.decode(text)?))
}

pub fn synthesize_upload(storage_base_url: &str, content_type: Option<&str>) -> UploadResponse {
    let file_id = Uuid::new_v4().to_string();
    let url = format!(
        "{}/{}{}",
        storage_base_url,
        file_id,
        extension_for(content_type)
    );

    UploadResponse {
        success: true,
        url,
        file_id,
    }
}

#[tracing::instrument(name = "Upload file", skip(inner, headers, body))]
pub async fn upload_file(
    State(inner): State<InnerState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let payload = decode_payload(body?, is_base64_encoded(&headers))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let upload = synthesize_upload(&inner.settings.storage_base_url, content_type);

    tracing::info!(
        file_id = %upload.file_id,
        content_type = ?content_type,
        size = payload.len(),
        "Issued upload URL"
    );

    Ok(json_response(StatusCode::OK, upload))
}
