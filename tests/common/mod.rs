//! Shared helpers for the database-backed API tests.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use coloby::{
    routes::create_app,
    state::{AppState, Config},
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

pub const PASSWORD: &str = "correct-horse-battery";
const BOUNDARY: &str = "coloby-test-boundary";

pub struct TestApp {
    app: NormalizePath<Router>,
    _media: TempDir,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        let media = tempfile::tempdir().unwrap();
        let mut config = Config::with_defaults("postgres://from-sqlx-test", "integration-secret");
        config.media_root = media.path().to_string_lossy().into_owned();

        let state = AppState::build(pool, config).unwrap();
        Self {
            app: create_app(state),
            _media: media,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Uploads `content` as the `file` part of a multipart form.
    pub async fn upload(&self, uri: &str, token: &str, file_name: &str, content: &str) -> (StatusCode, Value) {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::post(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Registers a user and returns an access token for it.
    pub async fn signup(&self, username: &str) -> String {
        let email = format!("{}@example.com", username);
        let (status, _) = self
            .json(
                Method::POST,
                "/api/register/",
                None,
                json!({"email": email, "username": username, "password": PASSWORD, "first_name": username}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .json(Method::POST, "/api/log-in/", None, json!({"email": email, "password": PASSWORD}))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a room and returns its slug.
    pub async fn create_room(&self, token: &str, name: &str, is_private: bool) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/room/",
                Some(token),
                json!({"action": "create", "room_name": name, "is_private": is_private}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["slug"].as_str().unwrap().to_string()
    }

    pub async fn join(&self, token: &str, slug: &str) -> StatusCode {
        let (status, _) = self
            .room_action(token, json!({"action": "join", "room_slug": slug}))
            .await;
        status
    }

    pub async fn room_action(&self, token: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, "/api/room/", Some(token), body).await
    }
}
