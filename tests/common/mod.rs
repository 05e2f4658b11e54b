//! Shared helpers for the integration tests
//!
//! Builds the router over a temporary database and a fake media host.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use portfolio::auth::TokenKeys;
use portfolio::database::{AppState, ProfileStore};
use portfolio::route::create_app;
use portfolio::uploader::{MediaUploader, UploadError, UploadOptions, UploadedFile};

pub const TEST_SECRET: &str = "test_secret";

/// One recorded call to the fake media host
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub field: String,
    pub file_name: String,
    pub options: UploadOptions,
}

/// Media host stand-in returning `https://media.test/{folder}/{file_name}`
#[derive(Default)]
pub struct FakeUploader {
    pub calls: Mutex<Vec<UploadCall>>,
    pub fail: bool,
}

impl FakeUploader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(
        &self,
        file: &UploadedFile,
        options: UploadOptions,
    ) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Other("media host unavailable".into()));
        }

        let file_name = file.file_name.clone().unwrap_or_default();
        self.calls.lock().unwrap().push(UploadCall {
            field: file.field.clone(),
            file_name: file_name.clone(),
            options,
        });
        Ok(media_url(options.folder.unwrap_or("auto"), &file_name))
    }
}

pub fn media_url(folder: &str, file_name: &str) -> String {
    format!("https://media.test/{}/{}", folder, file_name)
}

/// Test application plus handles the tests need to inspect
pub struct TestApp {
    pub app: Router,
    pub store: ProfileStore,
    pub uploader: Arc<FakeUploader>,
    _temp_db: NamedTempFile,
}

/// Helper function to create a test application with a temporary database
pub fn setup_test_app() -> TestApp {
    build(FakeUploader::default(), false)
}

pub fn setup_with_uploader(uploader: FakeUploader) -> TestApp {
    build(uploader, false)
}

pub fn setup_with_auth() -> TestApp {
    build(FakeUploader::default(), true)
}

fn build(uploader: FakeUploader, require_auth: bool) -> TestApp {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();
    let store = ProfileStore::open(db_path).expect("Failed to initialize test database");
    let uploader = Arc::new(uploader);

    let state = AppState::new(
        store.clone(),
        uploader.clone(),
        TokenKeys::new(TEST_SECRET),
        require_auth,
    );

    TestApp {
        app: create_app(state),
        store,
        uploader,
        _temp_db: temp_db,
    }
}

impl TestApp {
    /// Sends a request and returns the status plus the JSON body (`Null` if empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, response_json(response.into_body()).await)
    }

    pub async fn create_user(&self, name: &str, email: &str) {
        let (status, _) = self
            .send(json_request("POST", "/users", json!({ "name": name, "email": email })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

/// Helper function to parse response body as JSON
pub async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

pub fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

const BOUNDARY: &str = "portfolio-test-boundary";

/// Hand-built `multipart/form-data` body
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(b"fake-media-bytes");
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn image(self, name: &str, file_name: &str) -> Self {
        self.file(name, file_name, "image/png")
    }

    pub fn into_request(mut self, method: &str, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}
