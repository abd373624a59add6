use axum::{Router, routing::get};

use crate::handlers::pages;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/posts/", get(pages::post_list))
        .route("/posts/{id}", get(pages::post_detail))
        .route("/guestbooks/", get(pages::guestbook_list))
        .route("/portfolios/", get(pages::portfolio_list))
}
