use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn comments_are_listed_oldest_first() {
    let app = TestApp::spawn().await;
    let author = app.create_user("author").await;
    let post = app.create_post(author, "post", "Hello").await;

    let first = app.create_comment(post, author, "First!").await;
    let second = app.create_comment(post, author, "Second").await;

    let res = app.get(&routes::comments(post)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["data"][0]["id"], first);
    assert_eq!(res.body["data"][1]["id"], second);
}

#[tokio::test]
async fn blank_comment_is_rejected() {
    let app = TestApp::spawn().await;
    let author = app.create_user("author").await;
    let post = app.create_post(author, "post", "Hello").await;

    let res = app
        .post(
            &routes::comments(post),
            &json!({ "author_id": author, "content": "   " }),
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn commenting_on_trashed_post_returns_404() {
    let app = TestApp::spawn().await;
    let author = app.create_user("author").await;
    let post = app.create_post(author, "post", "Hello").await;
    app.delete(&routes::post(post)).await;

    let res = app
        .post(
            &routes::comments(post),
            &json!({ "author_id": author, "content": "Too late" }),
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn update_and_soft_delete_comment() {
    let app = TestApp::spawn().await;
    let author = app.create_user("author").await;
    let post = app.create_post(author, "post", "Hello").await;
    let id = app.create_comment(post, author, "Typo").await;

    let res = app
        .patch(&routes::comment(id), &json!({ "content": "Fixed" }))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["content"], "Fixed");

    assert_eq!(app.delete(&routes::comment(id)).await.status, 204);
    assert_eq!(app.get(&routes::comment(id)).await.status, 404);
    let list = app.get(&routes::comments(post)).await;
    assert_eq!(list.body["total"], 0);
}
