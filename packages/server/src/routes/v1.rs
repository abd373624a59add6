use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{attachments, comments, posts, users};
use crate::state::AppState;

/// Multipart framing allowance on top of the file size limit.
const UPLOAD_OVERHEAD: u64 = 1024 * 1024;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(user_routes())
        .merge(post_routes())
        .merge(comment_routes())
        .merge(attachment_routes(config))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(users::list_users, users::create_user))
        .routes(routes!(
            users::get_user,
            users::update_user,
            users::delete_user
        ))
}

fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(posts::list_posts, posts::create_post))
        .routes(routes!(posts::list_trash))
        .routes(routes!(
            posts::get_post,
            posts::update_post,
            posts::delete_post
        ))
        .routes(routes!(posts::restore_post))
        .routes(routes!(posts::purge_post))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comments::list_comments, comments::create_comment))
        .routes(routes!(
            comments::get_comment,
            comments::update_comment,
            comments::delete_comment
        ))
}

fn attachment_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let limit = config.storage.max_file_size.saturating_add(UPLOAD_OVERHEAD);

    OpenApiRouter::new()
        .routes(routes!(
            attachments::list_attachments,
            attachments::upload_attachment
        ))
        .routes(routes!(
            attachments::download_attachment,
            attachments::update_attachment,
            attachments::delete_attachment
        ))
        .routes(routes!(attachments::purge_attachment))
        .routes(routes!(attachments::set_post_image))
        .layer(DefaultBodyLimit::max(
            usize::try_from(limit).unwrap_or(usize::MAX),
        ))
}
