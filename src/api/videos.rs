use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::api::common::{json_response, parse_json_body};
use crate::errors::AppError;
use crate::InnerState;

const VIDEO_NOT_FOUND: &str = "Video not found";
const VIDEO_ID_REQUIRED: &str = "Video ID required";

#[derive(Debug, Serialize, FromRow, Clone, PartialEq)]
pub struct Video {
    pub id: i32,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub amount: Option<String>,
    pub views: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub id: Option<String>,
}

/// Display fields accepted on create and replace.
#[derive(Debug, Default, Deserialize)]
pub struct VideoPayload {
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub amount: Option<String>,
    pub views: Option<String>,
}

/// A payload with every default applied, ready to bind.
#[derive(Debug, PartialEq)]
pub struct VideoFields {
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub amount: String,
    pub views: String,
}

impl VideoPayload {
    /// Missing fields become empty strings; `views` falls back to `views_default`.
    pub fn into_fields(self, views_default: &str) -> VideoFields {
        VideoFields {
            title: self.title.unwrap_or_default(),
            video_url: self.video_url.unwrap_or_default(),
            thumbnail_url: self.thumbnail_url.unwrap_or_default(),
            amount: self.amount.unwrap_or_default(),
            views: self.views.unwrap_or_else(|| views_default.to_string()),
        }
    }
}

/// Video id as sent in a JSON body: a number or a numeric string.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum VideoId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct ReplaceVideoRequest {
    pub id: Option<VideoId>,
    #[serde(flatten)]
    pub fields: VideoPayload,
}

#[derive(Debug, Deserialize)]
pub struct DeleteVideoRequest {
    pub id: Option<VideoId>,
}

#[derive(Debug, Serialize)]
pub struct DeletedVideo {
    pub success: bool,
    pub id: i32,
}

/// Parses an integer id, tolerating surrounding whitespace.
fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::InvalidId(raw.to_string()))
}

/// Resolves a body id. Absent, null, zero and empty ids count as missing.
pub fn required_id(id: Option<VideoId>) -> Result<i32, AppError> {
    let missing = || AppError::Validation(VIDEO_ID_REQUIRED.to_string());

    match id {
        None => Err(missing()),
        Some(VideoId::Number(0)) => Err(missing()),
        Some(VideoId::Number(n)) => {
            i32::try_from(n).map_err(|_| AppError::InvalidId(n.to_string()))
        }
        Some(VideoId::Text(text)) if text.is_empty() => Err(missing()),
        Some(VideoId::Text(text)) => parse_id(&text),
    }
}

fn not_found() -> AppError {
    AppError::NotFound(VIDEO_NOT_FOUND.to_string())
}

#[tracing::instrument(name = "Fetch videos", skip(inner, query))]
pub async fn get_videos(
    State(inner): State<InnerState>,
    query: Result<Query<VideoQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let InnerState { db, .. } = inner;
    let Query(query) = query?;

    let mut conn = db.acquire().await?;

    match query.id.as_deref().filter(|id| !id.is_empty()) {
        Some(raw_id) => {
            let video_id = parse_id(raw_id)?;

            let video = sqlx::query_as::<_, Video>(
                r#"SELECT id, title, video_url, thumbnail_url, amount, views, created_at, updated_at
                   FROM videos WHERE id = $1"#,
            )
            .bind(video_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(not_found)?;

            Ok(json_response(StatusCode::OK, video))
        }
        None => {
            let videos = sqlx::query_as::<_, Video>(
                r#"SELECT id, title, video_url, thumbnail_url, amount, views, created_at, updated_at
                   FROM videos ORDER BY created_at DESC"#,
            )
            .fetch_all(&mut *conn)
            .await?;

            tracing::debug!("Fetched {} videos", videos.len());
            Ok(json_response(StatusCode::OK, videos))
        }
    }
}

#[tracing::instrument(name = "Create video", skip(inner, body))]
pub async fn create_video(
    State(inner): State<InnerState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let InnerState { db, .. } = inner;
    let body = body?;

    let mut conn = db.acquire().await?;

    let fields = parse_json_body::<VideoPayload>(&body)?.into_fields("0");

    let video = sqlx::query_as::<_, Video>(
        r#"INSERT INTO videos (title, video_url, thumbnail_url, amount, views, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
           RETURNING id, title, video_url, thumbnail_url, amount, views, created_at, updated_at"#,
    )
    .bind(fields.title)
    .bind(fields.video_url)
    .bind(fields.thumbnail_url)
    .bind(fields.amount)
    .bind(fields.views)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(video_id = video.id, "Created video");
    Ok(json_response(StatusCode::CREATED, video))
}

#[tracing::instrument(name = "Replace video", skip(inner, body))]
pub async fn replace_video(
    State(inner): State<InnerState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let InnerState { db, .. } = inner;
    let body = body?;

    let request = parse_json_body::<ReplaceVideoRequest>(&body)?;
    let video_id = required_id(request.id)?;
    let fields = request.fields.into_fields("");

    let mut conn = db.acquire().await?;

    let video = sqlx::query_as::<_, Video>(
        r#"UPDATE videos
           SET title = $2, video_url = $3, thumbnail_url = $4, amount = $5, views = $6,
               updated_at = CURRENT_TIMESTAMP
           WHERE id = $1
           RETURNING id, title, video_url, thumbnail_url, amount, views, created_at, updated_at"#,
    )
    .bind(video_id)
    .bind(fields.title)
    .bind(fields.video_url)
    .bind(fields.thumbnail_url)
    .bind(fields.amount)
    .bind(fields.views)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(not_found)?;

    tracing::info!(video_id, "Replaced video");
    Ok(json_response(StatusCode::OK, video))
}

#[tracing::instrument(name = "Delete video", skip(inner, body))]
pub async fn delete_video(
    State(inner): State<InnerState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let InnerState { db, .. } = inner;
    let body = body?;

    let request = parse_json_body::<DeleteVideoRequest>(&body)?;
    let video_id = required_id(request.id)?;

    let mut conn = db.acquire().await?;

    let deleted_id = sqlx::query_scalar::<_, i32>(r#"DELETE FROM videos WHERE id = $1 RETURNING id"#)
        .bind(video_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(video_id = deleted_id, "Deleted video");
    Ok(json_response(
        StatusCode::OK,
        DeletedVideo {
            success: true,
            id: deleted_id,
        },
    ))
}
