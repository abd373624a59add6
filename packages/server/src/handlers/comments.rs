use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, IntoActiveModel, QueryOrder, Set,
};
use tracing::instrument;

use crate::entity::comment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::handlers::posts::find_post;
use crate::handlers::users::find_user;
use crate::models::comment::{
    CommentListResponse, CommentResponse, CreateCommentRequest, UpdateCommentRequest,
};
use crate::models::shared::validate_body;
use crate::soft_delete::{self, SoftDelete};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments on a post",
    description = "Returns the active comments of a post, oldest first.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comment list", body = CommentListResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(post_id))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<Json<CommentListResponse>, AppError> {
    find_post(&state.db, post_id).await?;

    let data: Vec<CommentResponse> = comment::Entity::objects()
        .filter(comment::Column::PostId.eq(post_id))
        .find()
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();

    Ok(Json(CommentListResponse {
        total: data.len() as u64,
        data,
    }))
}

#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a post",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Post or author not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(post_id))]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_body("Content", &payload.content)?;
    find_post(&state.db, post_id).await?;
    find_user(&state.db, payload.author_id).await?;

    let now = Utc::now();
    let model = comment::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(payload.author_id),
        content: Set(payload.content),
        is_active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/comments/{id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment by ID",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment details", body = CommentResponse),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CommentResponse>, AppError> {
    Ok(Json(find_comment(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/comments/{id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let existing = find_comment(&state.db, id).await?;
    let Some(content) = payload.content else {
        return Ok(Json(existing.into()));
    };
    validate_body("Content", &content)?;

    let mut active = existing.into_active_model();
    active.content = Set(content);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/comments/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Soft-delete a comment",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_comment(&state.db, id).await?;
    soft_delete::delete(&state.db, existing).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<comment::Model, AppError> {
    comment::Entity::objects()
        .filter(comment::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}
