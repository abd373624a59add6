use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::comment;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    #[schema(example = 1)]
    pub author_id: i32,
    #[schema(example = "Nice post!")]
    pub content: String,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub data: Vec<CommentResponse>,
    pub total: u64,
}

impl From<comment::Model> for CommentResponse {
    fn from(m: comment::Model) -> Self {
        Self {
            id: m.id,
            post_id: m.post_id,
            author_id: m.author_id,
            content: m.content,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
