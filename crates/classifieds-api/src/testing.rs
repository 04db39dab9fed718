//! Test harness driving the real router in-process.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use classifieds_db::Database;

use crate::config::AppConfig;
use crate::media::MediaStorage;
use crate::routes::router;
use crate::state::{AppState, AppStateInner};

const BOUNDARY: &str = "classifieds-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::configured(|_| {}).await
    }

    pub async fn with_page_size(page_size: u64) -> Self {
        Self::configured(|cfg| cfg.page_size = page_size).await
    }

    pub async fn with_debug() -> Self {
        Self::configured(|cfg| cfg.debug = true).await
    }

    pub async fn with_upload_limit(bytes: usize) -> Self {
        Self::configured(|cfg| cfg.max_upload_bytes = bytes).await
    }

    async fn configured(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig {
            media_root: media_dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        adjust(&mut config);

        let media = MediaStorage::new(config.media_root.clone(), config.media_url.clone())
            .await
            .unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            config,
            media,
        });

        Self {
            router: router(state.clone()),
            state,
            _media_dir: media_dir,
        }
    }

    pub async fn send_raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    /// Sends a request and decodes the body as JSON (`Null` when empty or not JSON).
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(req).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, Body::empty())).await
    }

    pub async fn get_bytes(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        self.send_raw(request(Method::GET, uri, Body::empty())).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, Body::empty())).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    /// POST with an untyped body and no content type.
    pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, Body::from(body.to_string())))
            .await
    }

    /// Multipart upload of a single file field.
    pub async fn upload(
        &self,
        uri: &str,
        field: &str,
        file_name: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    /// Creates a user through the API and returns its id.
    pub async fn seed_user(&self, username: &str, location: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/user/create/",
                serde_json::json!({
                    "first_name": "Seed",
                    "username": username,
                    "password": "password",
                    "age": 25,
                    "location": location
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "seeding user failed: {body}");
        body["id"].as_i64().unwrap()
    }

    /// On-disk path behind a media URL returned by the API.
    pub fn media_path(&self, url: &str) -> PathBuf {
        let prefix = format!("{}/", self.state.config.media_url);
        let name = url.strip_prefix(&prefix).unwrap();
        self.state.media.path(name)
    }
}

fn request(method: Method, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap()
}
