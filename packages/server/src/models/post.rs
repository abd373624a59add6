use chrono::{DateTime, Utc};
use common::PostType;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option, validate_body, validate_title};
use crate::entity::post;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub post_type: PostType,
    #[schema(example = "Hello, world")]
    pub title: String,
    /// Markdown body.
    pub content: String,
    #[schema(example = 1)]
    pub author_id: i32,
    pub category_id: Option<i32>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdatePostRequest {
    pub post_type: Option<PostType>,
    pub title: Option<String>,
    pub content: Option<String>,
    /// `null` clears the category.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    /// Restrict to one kind of post.
    pub post_type: Option<PostType>,
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub post_type: PostType,
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub category_id: Option<i32>,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListResponse {
    pub data: Vec<PostResponse>,
    pub pagination: Pagination,
}

impl From<post::Model> for PostResponse {
    fn from(m: post::Model) -> Self {
        Self {
            id: m.id,
            post_type: m.post_type,
            title: m.title,
            content: m.content,
            author_id: m.author_id,
            category_id: m.category_id,
            is_active: m.is_active,
            deleted_at: m.deleted_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_create_post(req: &CreatePostRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    validate_body("Content", &req.content)
}

pub fn validate_update_post(req: &UpdatePostRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref content) = req.content {
        validate_body("Content", content)?;
    }
    Ok(())
}
