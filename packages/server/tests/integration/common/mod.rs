use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::FilesystemStorage;
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, CorsConfig, DatabaseConfig, PaginationConfig, ServerConfig, StorageConfig,
};
use server::state::AppState;

pub mod routes {
    pub const USERS: &str = "/api/v1/users";
    pub const POSTS: &str = "/api/v1/posts";
    pub const TRASH: &str = "/api/v1/posts/trash";

    pub fn user(id: i32) -> String {
        format!("/api/v1/users/{id}")
    }

    pub fn post(id: i32) -> String {
        format!("/api/v1/posts/{id}")
    }

    pub fn post_restore(id: i32) -> String {
        format!("/api/v1/posts/{id}/restore")
    }

    pub fn post_purge(id: i32) -> String {
        format!("/api/v1/posts/{id}/purge")
    }

    pub fn comments(post_id: i32) -> String {
        format!("/api/v1/posts/{post_id}/comments")
    }

    pub fn comment(id: i32) -> String {
        format!("/api/v1/comments/{id}")
    }

    pub fn attachments(post_id: i32) -> String {
        format!("/api/v1/posts/{post_id}/attachments")
    }

    pub fn attachment(post_id: i32, attachment_id: i32) -> String {
        format!("/api/v1/posts/{post_id}/attachments/{attachment_id}")
    }

    pub fn attachment_purge(post_id: i32, attachment_id: i32) -> String {
        format!("/api/v1/posts/{post_id}/attachments/{attachment_id}/purge")
    }

    pub fn post_image(post_id: i32) -> String {
        format!("/api/v1/posts/{post_id}/image")
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub storage: Arc<FilesystemStorage>,
    _media: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Optional multipart fields sent alongside an upload.
#[derive(Default)]
pub struct UploadFields<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub order: Option<i32>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_page_sizes(PaginationConfig::default()).await
    }

    pub async fn spawn_with_page_sizes(pagination: PaginationConfig) -> Self {
        let media = tempfile::tempdir().expect("Failed to create media directory");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            storage: StorageConfig {
                root: media.path().join("media"),
                max_file_size: 1024 * 1024,
            },
            pagination,
        };

        let db = server::database::init_db(&app_config.database)
            .await
            .expect("Failed to initialize test database");
        let storage = Arc::new(
            FilesystemStorage::new(
                app_config.storage.root.clone(),
                app_config.storage.max_file_size,
            )
            .await
            .expect("Failed to initialize test storage"),
        );

        let state = AppState {
            db: db.clone(),
            config: app_config,
            storage: storage.clone(),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            storage,
            _media: media,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_body(&self, path: &str, content_type: &str, body: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("content-type", content_type)
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// GET with the header htmx adds to its requests.
    pub async fn get_htmx(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// GET returning the raw response, for file downloads.
    pub async fn get_raw(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    async fn send_upload(
        &self,
        request: reqwest::RequestBuilder,
        file_name: &str,
        file_bytes: Vec<u8>,
        fields: UploadFields<'_>,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(name) = fields.name {
            form = form.text("name", name.to_string());
        }
        if let Some(description) = fields.description {
            form = form.text("description", description.to_string());
        }
        if let Some(order) = fields.order {
            form = form.text("order", order.to_string());
        }

        let res = request
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    pub async fn upload_attachment(
        &self,
        post_id: i32,
        file_name: &str,
        file_bytes: Vec<u8>,
        fields: UploadFields<'_>,
    ) -> TestResponse {
        let request = self.client.post(self.url(&routes::attachments(post_id)));
        self.send_upload(request, file_name, file_bytes, fields).await
    }

    pub async fn set_image(&self, post_id: i32, file_name: &str, file_bytes: Vec<u8>) -> TestResponse {
        let request = self.client.put(self.url(&routes::post_image(post_id)));
        self.send_upload(request, file_name, file_bytes, UploadFields::default())
            .await
    }

    /// Create a user via the API and return its `id`.
    pub async fn create_user(&self, username: &str) -> i32 {
        let res = self
            .post(
                routes::USERS,
                &serde_json::json!({
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": "password123",
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_user failed: {}", res.text);
        res.id()
    }

    /// Create a post of the given type via the API and return its `id`.
    pub async fn create_post(&self, author_id: i32, post_type: &str, title: &str) -> i32 {
        let res = self
            .post(
                routes::POSTS,
                &serde_json::json!({
                    "post_type": post_type,
                    "title": title,
                    "content": "Some **markdown**.",
                    "author_id": author_id,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_post failed: {}", res.text);
        res.id()
    }

    /// Create a comment via the API and return its `id`.
    pub async fn create_comment(&self, post_id: i32, author_id: i32, content: &str) -> i32 {
        let res = self
            .post(
                &routes::comments(post_id),
                &serde_json::json!({
                    "author_id": author_id,
                    "content": content,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_comment failed: {}", res.text);
        res.id()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
