//! File upload and download handlers.
//!
//! Uploads stream into the object store and announce themselves in chat;
//! downloads stream back out of the store without buffering the object.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::ws::types::resolve_display_name;
use crate::ws::Message;
use crate::AppState;

/// Response body for a successful upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_url: String,
    pub file_name: String,
}

/// Generate a collision-resistant object key: timestamp, random suffix and
/// the original file extension.
fn object_key(original_name: &str) -> String {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}{}",
        stamp,
        &suffix[..8],
        sanitized_extension(original_name)
    )
}

/// Extract a safe extension (including the dot) from a client filename.
fn sanitized_extension(name: &str) -> String {
    match std::path::Path::new(name).extension() {
        Some(ext) => {
            let clean: String = ext
                .to_string_lossy()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(16)
                .collect();
            if clean.is_empty() {
                String::new()
            } else {
                format!(".{}", clean)
            }
        }
        None => String::new(),
    }
}

fn multipart_err(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(format!("error parsing multipart request: {}", e))
    }
}

/// Body-limit violations surface as multipart errors buried inside the IO
/// error chain once the field stream is being copied into the store.
fn is_payload_too_large(e: &std::io::Error) -> bool {
    e.get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
        .map(|m| m.status() == StatusCode::PAYLOAD_TOO_LARGE)
        .unwrap_or(false)
}

/// POST /upload - store a file and announce it in chat.
///
/// Multipart fields: `file` (required) and `username` (optional, same
/// pseudonymous fallback as connecting). The chat message is only published
/// once the object is durably stored; a storage failure publishes nothing.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut username: Option<String> = None;
    let mut stored: Option<(String, String, u64)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let field_name = field.name().map(ToString::to_string);
        match field_name.as_deref() {
            Some("username") => {
                username = Some(field.text().await.map_err(multipart_err)?);
            }
            Some("file") if stored.is_none() => {
                let original_name = field
                    .file_name()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "upload".to_string());
                let key = object_key(&original_name);
                let content_type = mime_guess::from_path(&original_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string();

                let stream = field.map_err(std::io::Error::other);
                let mut reader = std::pin::pin!(StreamReader::new(stream));

                let size = match state.store.put(&key, &mut reader, &content_type).await {
                    Ok(size) => size,
                    Err(crate::storage::StorageError::Io(e)) if is_payload_too_large(&e) => {
                        return Err(ApiError::PayloadTooLarge);
                    }
                    Err(e) => {
                        error!("Failed to store upload {}: {}", original_name, e);
                        return Err(e.into());
                    }
                };
                stored = Some((key, original_name, size));
            }
            _ => {
                // Unknown fields are drained and ignored.
            }
        }
    }

    let (key, original_name, size) = stored.ok_or(ApiError::MissingFile)?;
    let username = resolve_display_name(username.as_deref());
    let file_url = format!("/download/{}", key);

    info!(
        "{} uploaded {} ({} bytes) as {}",
        username, original_name, size, key
    );
    state
        .hub
        .publish(Message::file_share(&username, &file_url, &original_name));

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file_url,
        file_name: original_name,
    }))
}

/// GET /download/{key} - stream a stored object back to the caller.
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let (meta, stream) = state.store.get(&key).await?;

    let content_type = meta
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let body = Body::from_stream(stream);

    // The original filename travels in the chat message; the attachment
    // header carries the object key.
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, meta.size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", meta.key),
            ),
        ],
        body,
    )
        .into_response())
}
