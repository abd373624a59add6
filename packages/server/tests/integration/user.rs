use serde_json::json;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn creates_user_with_normalized_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::USERS,
                &json!({
                    "email": "Jane@EXAMPLE.com",
                    "username": "jane",
                    "password": "password123",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "Jane@example.com");
        assert_eq!(res.body["username"], "jane");
        assert_eq!(res.body["is_staff"], false);
        assert_eq!(res.body["is_active"], true);
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;

        let no_email = app
            .post(
                routes::USERS,
                &json!({ "email": "", "username": "jane", "password": "password123" }),
            )
            .await;
        assert_eq!(no_email.status, 400);
        assert_eq!(no_email.body["code"], "VALIDATION_ERROR");

        let no_username = app
            .post(
                routes::USERS,
                &json!({ "email": "jane@example.com", "username": "  ", "password": "password123" }),
            )
            .await;
        assert_eq!(no_username.status, 400);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_even_after_deactivation() {
        let app = TestApp::spawn().await;
        let id = app.create_user("jane").await;

        let res = app.delete(&routes::user(id)).await;
        assert_eq!(res.status, 204);

        let dup = app
            .post(
                routes::USERS,
                &json!({
                    "email": "other@example.com",
                    "username": "jane",
                    "password": "password123",
                }),
            )
            .await;
        assert_eq!(dup.status, 409, "{}", dup.text);
        assert_eq!(dup.body["code"], "CONFLICT");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn update_changes_fields() {
        let app = TestApp::spawn().await;
        let id = app.create_user("jane").await;

        let res = app
            .patch(&routes::user(id), &json!({ "username": "janet" }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "janet");
        assert_eq!(res.body["email"], "jane@example.com");
    }

    #[tokio::test]
    async fn deactivated_user_is_hidden() {
        let app = TestApp::spawn().await;
        let keep = app.create_user("keep").await;
        let gone = app.create_user("gone").await;

        assert_eq!(app.delete(&routes::user(gone)).await.status, 204);

        assert_eq!(app.get(&routes::user(gone)).await.status, 404);
        let list = app.get(routes::USERS).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body["pagination"]["total"], 1);
        assert_eq!(list.body["data"][0]["id"], keep);
    }

    #[tokio::test]
    async fn unknown_user_returns_404() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::user(999)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
