use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, IntoActiveModel, PaginatorTrait, QueryOrder,
    QuerySelect, Set,
};
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::shared::{PageParams, Pagination};
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserListResponse, UserResponse};
use crate::soft_delete::{self, SoftDelete};
use crate::state::AppState;
use crate::users::{self, normalize_email};
use crate::utils::hash::hash_password;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Returns a paginated list of active users ordered by ID.",
    params(PageParams),
    responses(
        (status = 200, description = "User list", body = UserListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let (page, per_page) = params.resolve();
    let select = user::Entity::objects().find();

    let total = select.clone().paginate(&state.db, per_page).num_items().await?;
    let data = select
        .order_by_asc(user::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates an account. Email and username are required; the email domain is lowercased.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email or username taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = if payload.is_staff {
        users::create_superuser(&state.db, &payload.email, &payload.username, &payload.password)
            .await?
    } else {
        users::create_user(&state.db, &payload.email, &payload.username, &payload.password).await?
    };

    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(find_user(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Partially updates email, username or password.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email or username taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let existing = find_user(&state.db, id).await?;
    let mut active = existing.into_active_model();

    if let Some(email) = payload.email {
        if email.trim().is_empty() {
            return Err(AppError::Validation("The given email must be set".into()));
        }
        let email = normalize_email(&email);
        ensure_unique(&state.db, id, user::Column::Email, &email, "Email").await?;
        active.email = Set(email);
    }
    if let Some(username) = payload.username {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("The given username must be set".into()));
        }
        ensure_unique(&state.db, id, user::Column::Username, &username, "Username").await?;
        active.username = Set(username);
    }
    if let Some(password) = payload.password {
        if password.is_empty() {
            return Err(AppError::Validation("The given password must be set".into()));
        }
        let hash = hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;
        active.password = Set(hash);
    }

    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Deactivate a user",
    description = "Soft-deletes the account. It disappears from listings but stays in the database.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_user(&state.db, id).await?;
    soft_delete::delete(&state.db, existing).await?;
    tracing::info!(user_id = id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// Active user by ID.
pub(crate) async fn find_user<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<user::Model, AppError> {
    user::Entity::objects()
        .filter(user::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn ensure_unique<C: ConnectionTrait>(
    db: &C,
    id: i32,
    column: user::Column,
    value: &str,
    label: &str,
) -> Result<(), AppError> {
    let taken = user::Entity::all_objects()
        .filter(column.eq(value))
        .filter(user::Column::Id.ne(id))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!("{label} is already taken")));
    }
    Ok(())
}
