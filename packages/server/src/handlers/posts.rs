use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, IntoActiveModel, PaginatorTrait, QueryOrder,
    QuerySelect, Set,
};
use tracing::{info, instrument};

use crate::attachments::{AttachmentOwner, purge_attachments};
use crate::entity::{category, comment, post};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::handlers::users::find_user;
use crate::models::post::{
    CreatePostRequest, PostListQuery, PostListResponse, PostResponse, UpdatePostRequest,
    validate_create_post, validate_update_post,
};
use crate::models::shared::{PageParams, Pagination};
use crate::soft_delete::{self, SoftDelete};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/posts",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "List posts",
    description = "Returns active posts, newest first. `post_type` narrows the list to posts, guestbook entries or portfolio items.",
    params(PostListQuery),
    responses(
        (status = 200, description = "Post list", body = PostListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let (page, per_page) = PageParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut scope = post::Entity::objects();
    if let Some(post_type) = query.post_type {
        scope = scope.filter(post::Column::PostType.eq(post_type));
    }
    let select = scope.find();

    let total = select.clone().paginate(&state.db, per_page).num_items().await?;
    let data = select
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(PostResponse::from)
        .collect();

    Ok(Json(PostListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/posts/trash",
    tag = "Posts",
    operation_id = "listDeletedPosts",
    summary = "List soft-deleted posts",
    description = "Returns posts that were deleted but not purged, most recently deleted first.",
    params(PageParams),
    responses(
        (status = 200, description = "Deleted posts", body = PostListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_trash(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PostListResponse>, AppError> {
    let (page, per_page) = params.resolve();
    let select = post::Entity::objects().inactive().find();

    let total = select.clone().paginate(&state.db, per_page).num_items().await?;
    let data = select
        .order_by_desc(post::Column::DeletedAt)
        .order_by_desc(post::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(PostResponse::from)
        .collect();

    Ok(Json(PostListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/posts",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Create a post",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Author or category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_post(&payload)?;
    find_user(&state.db, payload.author_id).await?;
    if let Some(category_id) = payload.category_id {
        find_category(&state.db, category_id).await?;
    }

    let now = Utc::now();
    let model = post::ActiveModel {
        post_type: Set(payload.post_type),
        title: Set(payload.title.trim().to_string()),
        content: Set(payload.content),
        author_id: Set(payload.author_id),
        category_id: Set(payload.category_id),
        is_active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(post_id = model.id, post_type = %model.post_type, "Post created");
    Ok((StatusCode::CREATED, Json(PostResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = "Posts",
    operation_id = "getPost",
    summary = "Get a post by ID",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    Ok(Json(find_post(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/posts/{id}",
    tag = "Posts",
    operation_id = "updatePost",
    summary = "Update a post",
    description = "Partially updates a post. Send `category_id: null` to clear the category.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Post or category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    validate_update_post(&payload)?;
    let existing = find_post(&state.db, id).await?;

    let mut active = existing.into_active_model();
    if let Some(post_type) = payload.post_type {
        active.post_type = Set(post_type);
    }
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(category_id) = payload.category_id {
        if let Some(cid) = category_id {
            find_category(&state.db, cid).await?;
        }
        active.category_id = Set(category_id);
    }

    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "Posts",
    operation_id = "deletePost",
    summary = "Soft-delete a post",
    description = "Moves the post to the trash. It can be restored until it is purged.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_post(&state.db, id).await?;
    soft_delete::delete(&state.db, existing).await?;
    info!(post_id = id, "Post moved to trash");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/posts/{id}/restore",
    tag = "Posts",
    operation_id = "restorePost",
    summary = "Restore a soft-deleted post",
    description = "Reactivates a post. Restoring an active post is a no-op.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post restored", body = PostResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn restore_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let existing = find_any_post(&state.db, id).await?;
    let restored = if existing.is_active {
        existing
    } else {
        soft_delete::restore(&state.db, existing).await?
    };
    info!(post_id = id, "Post restored");
    Ok(Json(restored.into()))
}

#[utoipa::path(
    delete,
    path = "/posts/{id}/purge",
    tag = "Posts",
    operation_id = "purgePost",
    summary = "Permanently delete a post",
    description = "Removes the post, its comments and every attachment of either, including the stored files. \
        If a file cannot be removed the purge stops and the post is kept.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post purged"),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "File removal failed (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn purge_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_any_post(&state.db, id).await?;
    let storage = &*state.storage;

    let comments = comment::Entity::all_objects()
        .filter(comment::Column::PostId.eq(id))
        .all(&state.db)
        .await?;
    for c in &comments {
        if let Some(owner) = c.owner_ref() {
            purge_attachments(&state.db, storage, owner).await?;
        }
    }
    if let Some(owner) = existing.owner_ref() {
        purge_attachments(&state.db, storage, owner).await?;
    }

    comment::Entity::all_objects()
        .filter(comment::Column::PostId.eq(id))
        .hard_delete(&state.db)
        .await?;
    soft_delete::hard_delete(&state.db, existing).await?;

    info!(post_id = id, comments = comments.len(), "Post purged");
    Ok(StatusCode::NO_CONTENT)
}

/// Active post by ID.
pub(crate) async fn find_post<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<post::Model, AppError> {
    post::Entity::objects()
        .filter(post::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

/// Post by ID regardless of its soft-delete flag.
async fn find_any_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<post::Model, AppError> {
    post::Entity::all_objects()
        .filter(post::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

async fn find_category<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<category::Model, AppError> {
    category::Entity::objects()
        .filter(category::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}
