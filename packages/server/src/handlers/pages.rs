//! Render contexts for the server-rendered pages.
//!
//! Each handler answers with the template to render and the data it needs.
//! Requests sent by htmx (`HX-Request` header) get the partial template so
//! only the list fragment is swapped in.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::PostType;
use sea_orm::{ColumnTrait, PaginatorTrait, QueryOrder, QuerySelect};
use tracing::instrument;

use crate::attachments::AttachmentOwner;
use crate::entity::{comment, post};
use crate::error::AppError;
use crate::handlers::posts::find_post;
use crate::models::attachment::AttachmentResponse;
use crate::models::comment::CommentResponse;
use crate::models::page::{DetailContext, HomeContext, ListContext, PageQuery};
use crate::models::post::PostResponse;
use crate::pagination::Page;
use crate::soft_delete::SoftDelete;
use crate::state::AppState;

pub const HX_REQUEST: &str = "hx-request";

/// `<type>_list_partial.html` for htmx requests, `<type>_list.html` otherwise.
pub fn list_template(post_type: PostType, headers: &HeaderMap) -> String {
    if headers.contains_key(HX_REQUEST) {
        format!("{post_type}_list_partial.html")
    } else {
        format!("{post_type}_list.html")
    }
}

pub async fn home() -> Json<HomeContext> {
    Json(HomeContext {
        template: "home.html",
    })
}

pub async fn post_list(
    state: State<AppState>,
    headers: HeaderMap,
    query: Query<PageQuery>,
) -> Result<Json<ListContext>, AppError> {
    list_page(state, headers, query, PostType::Post).await
}

pub async fn guestbook_list(
    state: State<AppState>,
    headers: HeaderMap,
    query: Query<PageQuery>,
) -> Result<Json<ListContext>, AppError> {
    list_page(state, headers, query, PostType::Guestbook).await
}

pub async fn portfolio_list(
    state: State<AppState>,
    headers: HeaderMap,
    query: Query<PageQuery>,
) -> Result<Json<ListContext>, AppError> {
    list_page(state, headers, query, PostType::Portfolio).await
}

#[instrument(skip(state, headers, query))]
async fn list_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
    post_type: PostType,
) -> Result<Json<ListContext>, AppError> {
    let per_page = match post_type {
        PostType::Portfolio => state.config.pagination.portfolio_page_size,
        _ => state.config.pagination.post_page_size,
    };

    let select = post::Entity::objects()
        .filter(post::Column::PostType.eq(post_type))
        .find();
    let count = select.clone().paginate(&state.db, per_page.max(1)).num_items().await?;
    let page = Page::resolve(query.page.as_deref(), count, per_page)?;

    let items = select
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .offset(Some(page.offset()))
        .limit(Some(page.per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(PostResponse::from)
        .collect();

    Ok(Json(ListContext {
        template: list_template(post_type, &headers),
        items,
        page,
    }))
}

#[instrument(skip(state))]
pub async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DetailContext>, AppError> {
    let post = find_post(&state.db, id).await?;

    let comments = comment::Entity::objects()
        .filter(comment::Column::PostId.eq(id))
        .find()
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    let attachments = post
        .get_attachments(&state.db, None)
        .await?
        .into_iter()
        .map(AttachmentResponse::from)
        .collect();

    Ok(Json(DetailContext {
        template: "post_detail.html",
        post: post.into(),
        comments,
        attachments,
    }))
}
