//! Message and attachment handlers.
//!
//! Messages the caller may not access answer 404, the same as missing ones.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::mail::{Attachment, MessageView};
use crate::web::dto::{AttachmentResponse, MessageRequest, MessageResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

fn message_not_found() -> ApiError {
    ApiError::not_found("message not found")
}

fn attachment_not_found() -> ApiError {
    ApiError::not_found("attachment not found")
}

/// Load a message the caller may read.
async fn readable_message(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> Result<MessageView, ApiError> {
    state
        .message_service()
        .get(id)
        .await?
        .filter(|view| view.is_readable_by(user.id(), user.email()))
        .ok_or_else(message_not_found)
}

/// Load a message the caller sent.
async fn owned_message(state: &AppState, user: &AuthUser, id: i64) -> Result<MessageView, ApiError> {
    state
        .message_service()
        .get(id)
        .await?
        .filter(|view| view.is_sender(user.id()))
        .ok_or_else(message_not_found)
}

/// Load attachment metadata whose message the caller may read.
async fn readable_attachment(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> Result<Attachment, ApiError> {
    let attachment = state
        .message_service()
        .get_attachment(id)
        .await?
        .ok_or_else(attachment_not_found)?;

    readable_message(state, user, attachment.message_id)
        .await
        .map_err(|_| attachment_not_found())?;

    Ok(attachment)
}

fn to_responses(views: Vec<MessageView>) -> Json<Vec<MessageResponse>> {
    Json(views.into_iter().map(Into::into).collect())
}

/// POST /api/email/send
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let view = state
        .message_service()
        .send(&req.to_compose(user.id()))
        .await?;
    Ok(Json(view.into()))
}

/// POST /api/email/draft
pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let view = state
        .message_service()
        .save_draft(&req.to_compose(user.id()))
        .await?;
    Ok(Json(view.into()))
}

/// GET /api/email/:id
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let view = readable_message(&state, &user, id).await?;
    Ok(Json(view.into()))
}

/// GET /api/email/inbox
pub async fn inbox(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let views = state
        .message_service()
        .inbox(user.id(), user.email())
        .await?;
    Ok(to_responses(views))
}

/// GET /api/email/sent
pub async fn sent(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let views = state.message_service().sent(user.id()).await?;
    Ok(to_responses(views))
}

/// GET /api/email/drafts
pub async fn drafts(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let views = state
        .message_service()
        .drafts(user.id(), user.email())
        .await?;
    Ok(to_responses(views))
}

/// PUT /api/email/:id
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.id.is_some_and(|body_id| body_id != id) {
        return Err(ApiError::bad_request("message id does not match"));
    }

    owned_message(&state, &user, id).await?;

    let view = state
        .message_service()
        .update(id, &req.to_update())
        .await?
        .ok_or_else(message_not_found)?;

    tracing::info!(message_id = id, user_id = user.id(), "message updated");
    Ok(Json(view.into()))
}

/// DELETE /api/email/:id
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    owned_message(&state, &user, id).await?;

    if !state.message_service().delete(id).await? {
        return Err(message_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/email/:id/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    readable_message(&state, &user, id).await?;

    if !state.message_service().mark_read(id).await? {
        return Err(message_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("File too large");
    }
    tracing::warn!(error = %err, "failed to read multipart body");
    ApiError::bad_request("Invalid multipart data")
}

/// POST /api/email/:id/attachments
///
/// Expects multipart/form-data with a `file` field.
pub async fn add_attachment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<AttachmentResponse>, ApiError> {
    owned_message(&state, &user, id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .to_string()
            });
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some((file_name, content_type, data));
        break;
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    if data.len() as u64 > state.max_upload_size {
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {} bytes)",
            state.max_upload_size
        )));
    }

    let attachment = state
        .message_service()
        .add_attachment(id, &data, &file_name, &content_type)
        .await?
        .ok_or_else(message_not_found)?;

    Ok(Json(attachment.into()))
}

/// GET /api/email/attachments/:id
pub async fn get_attachment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AttachmentResponse>, ApiError> {
    let attachment = readable_attachment(&state, &user, id).await?;
    Ok(Json(attachment.into()))
}

/// GET /api/email/attachments/:id/download
pub async fn download_attachment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    readable_attachment(&state, &user, id).await?;

    let download = state.message_service().download_attachment(id).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, &download.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&download.file_name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!(error = %e, "failed to build download response");
            ApiError::internal("An internal error occurred")
        })
}

/// `Content-Disposition` for a download.
///
/// Plain ASCII names go in `filename`. Anything else gets a scrubbed ASCII
/// fallback plus an RFC 5987 `filename*`.
fn content_disposition(file_name: &str) -> String {
    let plain = file_name
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');
    if plain {
        return format!("attachment; filename=\"{file_name}\"");
    }

    let fallback: String = file_name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}
