use common::storage::FileStorage;
use serde_json::json;

use crate::common::{TestApp, UploadFields, routes};

mod crud {
    use super::*;

    #[tokio::test]
    async fn create_defaults_to_blog_post() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;

        let res = app
            .post(
                routes::POSTS,
                &json!({ "title": "Hello", "content": "World", "author_id": author }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["post_type"], "post");
        assert_eq!(res.body["is_active"], true);
        assert!(res.body["deleted_at"].is_null());
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;

        let res = app
            .post(
                routes::POSTS,
                &json!({ "title": "   ", "content": "World", "author_id": author }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_body(routes::POSTS, "application/json", r#"{"title": "Hello""#)
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .post_body(routes::POSTS, "text/plain", r#"{"title": "Hello"}"#)
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_author_returns_404() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::POSTS,
                &json!({ "title": "Hello", "content": "World", "author_id": 42 }),
            )
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn huge_page_number_returns_empty_page() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        app.create_post(author, "post", "Only").await;

        let res = app
            .get(&format!("{}?page={}", routes::POSTS, u64::MAX))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
        assert_eq!(res.body["pagination"]["total"], 1);

        let users = app.get(&format!("{}?page={}", routes::USERS, u64::MAX)).await;
        assert_eq!(users.status, 200, "{}", users.text);
    }

    #[tokio::test]
    async fn list_filters_by_post_type() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        app.create_post(author, "post", "Blog").await;
        app.create_post(author, "guestbook", "Hi!").await;
        let work = app.create_post(author, "portfolio", "Work").await;

        let res = app
            .get(&format!("{}?post_type=portfolio", routes::POSTS))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["id"], work);

        let all = app.get(routes::POSTS).await;
        assert_eq!(all.body["pagination"]["total"], 3);
    }

    #[tokio::test]
    async fn update_changes_title() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        let id = app.create_post(author, "post", "Draft").await;

        let res = app
            .patch(&routes::post(id), &json!({ "title": "Final" }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Final");
    }
}

mod trash {
    use super::*;

    #[tokio::test]
    async fn soft_delete_moves_post_to_trash() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        let id = app.create_post(author, "post", "Old").await;

        assert_eq!(app.delete(&routes::post(id)).await.status, 204);

        assert_eq!(app.get(&routes::post(id)).await.status, 404);
        let list = app.get(routes::POSTS).await;
        assert_eq!(list.body["pagination"]["total"], 0);

        let trash = app.get(routes::TRASH).await;
        assert_eq!(trash.status, 200);
        assert_eq!(trash.body["pagination"]["total"], 1);
        assert_eq!(trash.body["data"][0]["id"], id);
        assert_eq!(trash.body["data"][0]["is_active"], false);
        assert!(trash.body["data"][0]["deleted_at"].is_string());
    }

    #[tokio::test]
    async fn deleting_twice_returns_404() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        let id = app.create_post(author, "post", "Old").await;

        assert_eq!(app.delete(&routes::post(id)).await.status, 204);
        assert_eq!(app.delete(&routes::post(id)).await.status, 404);
    }

    #[tokio::test]
    async fn restore_brings_post_back() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        let id = app.create_post(author, "post", "Old").await;
        app.delete(&routes::post(id)).await;

        let res = app.post_empty(&routes::post_restore(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_active"], true);
        assert!(res.body["deleted_at"].is_null());

        assert_eq!(app.get(&routes::post(id)).await.status, 200);
        let trash = app.get(routes::TRASH).await;
        assert_eq!(trash.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn restoring_active_post_is_a_no_op() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        let id = app.create_post(author, "post", "Live").await;

        let res = app.post_empty(&routes::post_restore(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["is_active"], true);
    }
}

mod purge {
    use super::*;

    #[tokio::test]
    async fn purge_removes_post_comments_and_files() {
        let app = TestApp::spawn().await;
        let author = app.create_user("author").await;
        let id = app.create_post(author, "portfolio", "Gallery").await;
        let comment = app.create_comment(id, author, "Lovely").await;

        let upload = app
            .upload_attachment(id, "cover.png", b"png bytes".to_vec(), UploadFields::default())
            .await;
        assert_eq!(upload.status, 201, "{}", upload.text);
        let file = upload.body["file"].as_str().unwrap().to_string();
        assert!(app.storage.exists(&file).await.unwrap());

        app.delete(&routes::post(id)).await;
        let res = app.delete(&routes::post_purge(id)).await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert!(!app.storage.exists(&file).await.unwrap());
        assert_eq!(app.get(&routes::comment(comment)).await.status, 404);
        assert_eq!(app.post_empty(&routes::post_restore(id)).await.status, 404);
        let trash = app.get(routes::TRASH).await;
        assert_eq!(trash.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn purge_unknown_post_returns_404() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::post_purge(404)).await;
        assert_eq!(res.status, 404);
    }
}
