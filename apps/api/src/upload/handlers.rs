//! Avatar upload endpoints. Type and size are validated before any S3
//! call; keys live under a fixed prefix so delete can never reach outside
//! the avatar space.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Request body cap for the avatar route. Axum's default limit is 2 MB,
/// below `MAX_AVATAR_BYTES`; the route raises it to the avatar limit plus
/// headroom for multipart framing, leaving `validate_avatar` as the
/// authoritative size check.
pub const MAX_AVATAR_REQUEST_BYTES: usize = MAX_AVATAR_BYTES + 64 * 1024;

const AVATAR_PREFIX: &str = "avatars/";

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Checks content type and size, returning the stored file extension.
pub fn validate_avatar(content_type: &str, len: usize) -> Result<&'static str, String> {
    let ext = extension_for(content_type).ok_or_else(|| {
        format!("unsupported image type: {content_type} (expected jpeg, png or webp)")
    })?;
    if len == 0 {
        return Err("uploaded file is empty".to_string());
    }
    if len > MAX_AVATAR_BYTES {
        return Err(format!(
            "file too large: {len} bytes (limit {MAX_AVATAR_BYTES})"
        ));
    }
    Ok(ext)
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub key: String,
    pub url: String,
}

/// POST /api/upload/avatar
pub async fn handle_upload_avatar(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        let ext = validate_avatar(&content_type, data.len()).map_err(AppError::Validation)?;

        let key = format!("{AVATAR_PREFIX}{}.{ext}", Uuid::new_v4());
        state
            .s3
            .put_object()
            .bucket(&state.config.s3_bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("S3 upload failed: {e}")))?;
        info!("Uploaded avatar to s3://{}/{}", state.config.s3_bucket, key);

        let url = format!(
            "{}/{}/{}",
            state.config.s3_endpoint.trim_end_matches('/'),
            state.config.s3_bucket,
            key
        );
        return Ok(Json(UploadResponse { key, url }));
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub key: String,
}

/// DELETE /api/upload/avatar?key=...
pub async fn handle_delete_avatar(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, AppError> {
    if !query.key.starts_with(AVATAR_PREFIX) || query.key.len() <= AVATAR_PREFIX.len() {
        return Err(AppError::Validation(
            "key must point at an uploaded avatar".to_string(),
        ));
    }

    state
        .s3
        .delete_object()
        .bucket(&state.config.s3_bucket)
        .key(&query.key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("S3 delete failed: {e}")))?;
    info!("Deleted avatar s3://{}/{}", state.config.s3_bucket, query.key);

    Ok(Json(json!({ "deleted": query.key })))
}
