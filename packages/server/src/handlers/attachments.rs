use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use chrono::Utc;
use common::storage::{BoxReader, FileStorage};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, IntoActiveModel, Set};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::attachments::{self, AttachmentOwner, NewAttachment};
use crate::entity::{attachment, post};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::handlers::posts::find_post;
use crate::models::attachment::{
    AttachmentListQuery, AttachmentListResponse, AttachmentResponse, UpdateAttachmentRequest,
};
use crate::soft_delete::{self, SoftDelete};
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;

/// Multipart fields of an upload. The file itself is spooled to `spool`.
struct UploadForm {
    filename: String,
    spool: PathBuf,
    name: Option<String>,
    description: String,
    order: i32,
}

impl UploadForm {
    async fn open(&self) -> Result<NewAttachment, AppError> {
        let file = tokio::fs::File::open(&self.spool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen upload: {e}")))?;
        let reader: BoxReader = Box::new(file);

        let mut upload = NewAttachment::from_reader(self.filename.clone(), reader)
            .with_description(self.description.clone())
            .with_order(self.order);
        upload.name = self.name.clone();
        Ok(upload)
    }
}

/// What a stored upload becomes on the post.
#[derive(Clone, Copy)]
enum UploadTarget {
    Attachment,
    Image,
}

#[utoipa::path(
    post,
    path = "/posts/{id}/attachments",
    tag = "Attachments",
    operation_id = "uploadAttachment",
    summary = "Attach a file to a post",
    description = "Uploads a file and attaches it to the post. The `file` multipart field is required. \
        Optional fields: `name` (display name, defaults to the stored filename), `description` and \
        `order`. File type, MIME type and size are derived from the stored file.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body(content_type = "multipart/form-data", description = "File upload with optional metadata"),
    responses(
        (status = 201, description = "Attachment created", body = AttachmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(post_id))]
pub async fn upload_attachment(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&state.db, post_id).await?;
    let created = store_upload(&state, &post, multipart, UploadTarget::Attachment).await?;

    Ok((StatusCode::CREATED, Json(AttachmentResponse::from(created))))
}

#[utoipa::path(
    put,
    path = "/posts/{id}/image",
    tag = "Attachments",
    operation_id = "setPostImage",
    summary = "Replace the post's image",
    description = "Soft-deletes the post's current image attachments and attaches the upload as its image.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body(content_type = "multipart/form-data", description = "Image upload"),
    responses(
        (status = 201, description = "Image attached", body = AttachmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(post_id))]
pub async fn set_post_image(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&state.db, post_id).await?;
    let created = store_upload(&state, &post, multipart, UploadTarget::Image).await?;

    Ok((StatusCode::CREATED, Json(AttachmentResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/posts/{id}/attachments",
    tag = "Attachments",
    operation_id = "listAttachments",
    summary = "List a post's attachments",
    description = "Returns the active attachments of a post in display order. \
        `file_type` restricts the list to one kind of file.",
    params(("id" = i32, Path, description = "Post ID"), AttachmentListQuery),
    responses(
        (status = 200, description = "Attachment list", body = AttachmentListResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(post_id))]
pub async fn list_attachments(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    Query(query): Query<AttachmentListQuery>,
) -> Result<Json<AttachmentListResponse>, AppError> {
    let post = find_post(&state.db, post_id).await?;
    let rows = post.get_attachments(&state.db, query.file_type).await?;

    Ok(Json(AttachmentListResponse {
        total: rows.len() as u64,
        attachments: rows.into_iter().map(AttachmentResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/posts/{id}/attachments/{attachment_id}",
    tag = "Attachments",
    operation_id = "downloadAttachment",
    summary = "Download an attachment",
    description = "Streams the stored file.",
    params(
        ("id" = i32, Path, description = "Post ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID"),
    ),
    responses(
        (status = 200, description = "Attachment content"),
        (status = 404, description = "Attachment or file not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(post_id, attachment_id))]
pub async fn download_attachment(
    State(state): State<AppState>,
    Path((post_id, attachment_id)): Path<(i32, i32)>,
) -> Result<Response, AppError> {
    let post = find_post(&state.db, post_id).await?;
    let model = find_post_attachment(&state.db, &post, attachment_id, false).await?;

    build_file_response(&model, &*state.storage).await
}

#[utoipa::path(
    patch,
    path = "/posts/{id}/attachments/{attachment_id}",
    tag = "Attachments",
    operation_id = "updateAttachment",
    summary = "Edit attachment details",
    description = "Updates the display name, description or order. Derived metadata is never recomputed.",
    params(
        ("id" = i32, Path, description = "Post ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID"),
    ),
    request_body = UpdateAttachmentRequest,
    responses(
        (status = 200, description = "Attachment updated", body = AttachmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Attachment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(post_id, attachment_id))]
pub async fn update_attachment(
    State(state): State<AppState>,
    Path((post_id, attachment_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateAttachmentRequest>,
) -> Result<Json<AttachmentResponse>, AppError> {
    let post = find_post(&state.db, post_id).await?;
    let model = find_post_attachment(&state.db, &post, attachment_id, false).await?;

    let mut active = model.into_active_model();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(order) = payload.order {
        active.order = Set(order);
    }

    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/posts/{id}/attachments/{attachment_id}",
    tag = "Attachments",
    operation_id = "deleteAttachment",
    summary = "Soft-delete an attachment",
    description = "Hides the attachment. The stored file is kept until the attachment is purged.",
    params(
        ("id" = i32, Path, description = "Post ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID"),
    ),
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 404, description = "Attachment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(post_id, attachment_id))]
pub async fn delete_attachment(
    State(state): State<AppState>,
    Path((post_id, attachment_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&state.db, post_id).await?;
    let model = find_post_attachment(&state.db, &post, attachment_id, false).await?;
    soft_delete::delete(&state.db, model).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/posts/{id}/attachments/{attachment_id}/purge",
    tag = "Attachments",
    operation_id = "purgeAttachment",
    summary = "Permanently delete an attachment",
    description = "Removes the stored file, then the record. Works on soft-deleted attachments too. \
        If the file cannot be removed the record is kept and a storage error is returned.",
    params(
        ("id" = i32, Path, description = "Post ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID"),
    ),
    responses(
        (status = 204, description = "Attachment purged"),
        (status = 404, description = "Attachment not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "File removal failed (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(post_id, attachment_id))]
pub async fn purge_attachment(
    State(state): State<AppState>,
    Path((post_id, attachment_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&state.db, post_id).await?;
    let model = find_post_attachment(&state.db, &post, attachment_id, true).await?;
    attachments::hard_delete(&state.db, &*state.storage, model).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Read the form, hand the spooled file to the attachment layer, then drop the spool.
async fn store_upload(
    state: &AppState,
    post: &post::Model,
    multipart: Multipart,
    target: UploadTarget,
) -> Result<attachment::Model, AppError> {
    let form = read_upload_form(multipart, state.config.storage.max_file_size).await?;

    let result = async {
        let upload = form.open().await?;
        let created = match target {
            UploadTarget::Attachment => {
                post.add_attachment(&state.db, &*state.storage, upload).await?
            }
            UploadTarget::Image => post.set_image(&state.db, &*state.storage, upload).await?,
        };
        Ok::<_, AppError>(created)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&form.spool).await;

    result
}

/// Read the upload form, spooling the file to a temp file capped at `max_size` bytes.
async fn read_upload_form(multipart: Multipart, max_size: u64) -> Result<UploadForm, AppError> {
    let spool = std::env::temp_dir().join(format!("blog-upload-{}", Uuid::new_v4()));

    let result = read_form_fields(multipart, &spool, max_size).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&spool).await;
    }
    result
}

async fn read_form_fields(
    mut multipart: Multipart,
    spool: &FsPath,
    max_size: u64,
) -> Result<UploadForm, AppError> {
    let mut filename = None;
    let mut name = None;
    let mut description = String::new();
    let mut order = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
                spool_field(field, spool, max_size).await?;
                filename = Some(file_name);
            }
            Some("name") => name = Some(read_text(field, "name").await?),
            Some("description") => description = read_text(field, "description").await?,
            Some("order") => {
                order = read_text(field, "order")
                    .await?
                    .trim()
                    .parse()
                    .map_err(|_| AppError::Validation("Order must be an integer".into()))?;
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let filename = filename.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    Ok(UploadForm {
        filename,
        spool: spool.to_path_buf(),
        name: name.filter(|n: &String| !n.trim().is_empty()),
        description,
        order,
    })
}

/// Write a multipart field to `spool` chunk by chunk.
async fn spool_field(
    mut field: axum::extract::multipart::Field<'_>,
    spool: &FsPath,
    max_size: u64,
) -> Result<(), AppError> {
    let mut temp_file = tokio::fs::File::create(spool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    let mut total_size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?
    {
        total_size += chunk.len() as u64;
        if total_size > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {max_size} byte limit"
            )));
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
    Ok(())
}

async fn read_text(field: axum::extract::multipart::Field<'_>, label: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {label}: {e}")))
}

/// Attachment of `post` by ID. Inactive rows are only found when `include_inactive` is set.
async fn find_post_attachment<C: ConnectionTrait>(
    db: &C,
    post: &post::Model,
    attachment_id: i32,
    include_inactive: bool,
) -> Result<attachment::Model, AppError> {
    let found = if include_inactive {
        attachment::Entity::all_objects()
            .filter(attachment::Column::Id.eq(attachment_id))
            .one(db)
            .await?
    } else {
        attachment::Entity::objects()
            .filter(attachment::Column::Id.eq(attachment_id))
            .one(db)
            .await?
    };

    found
        .filter(|a| a.owner() == post.owner_ref())
        .ok_or_else(|| AppError::NotFound("Attachment not found".into()))
}

/// Stream a stored file back with its recorded metadata.
async fn build_file_response(
    model: &attachment::Model,
    storage: &dyn FileStorage,
) -> Result<Response, AppError> {
    let reader = storage.open(&model.file).await?;
    let stream = ReaderStream::new(reader);
    let body = Body::from_stream(stream);

    let content_type = if model.mime_type.is_empty() {
        "application/octet-stream"
    } else {
        model.mime_type.as_str()
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition_value(&model.name))
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    info!(attachment_id = model.id, "Serving attachment");
    Ok(response)
}
