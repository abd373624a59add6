use serde::{Deserialize, Serialize};

use super::attachment::AttachmentResponse;
use super::comment::CommentResponse;
use super::post::PostResponse;
use crate::pagination::Page;

/// `?page=` on the list pages: a number or `last`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Render context for the home page.
#[derive(Serialize)]
pub struct HomeContext {
    pub template: &'static str,
}

/// Render context for a paginated list page.
#[derive(Serialize)]
pub struct ListContext {
    pub template: String,
    pub items: Vec<PostResponse>,
    pub page: Page,
}

/// Render context for a single post.
#[derive(Serialize)]
pub struct DetailContext {
    pub template: &'static str,
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub attachments: Vec<AttachmentResponse>,
}
