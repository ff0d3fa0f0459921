#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use product_api::{
    AppError, AppState, app,
    config::UploadConfig,
    error::Result,
    models::{NewProduct, Product},
    store::{MemoryProductStore, ProductStore},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const MAX_FILE_SIZE: usize = 1024;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryProductStore::new()))
    }

    pub fn with_store(store: Arc<dyn ProductStore>) -> Self {
        let upload_dir = tempfile::tempdir().expect("create upload dir");
        let uploads = UploadConfig {
            dir: upload_dir.path().to_path_buf(),
            max_file_size: MAX_FILE_SIZE,
        };
        let state = AppState::new(store, uploads);

        Self {
            router: app::router(state.clone()),
            state,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn multipart(&self, method: &str, uri: &str, form: MultipartForm) -> TestResponse {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// A store whose every call fails as if the connection pool were exhausted.
pub struct UnavailableStore;

fn pool_timed_out() -> AppError {
    AppError::DatabaseError(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl ProductStore for UnavailableStore {
    async fn create(&self, _product: NewProduct) -> Result<Product> {
        Err(pool_timed_out())
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        Err(pool_timed_out())
    }

    async fn find_by_id(&self, _id: i32) -> Result<Option<Product>> {
        Err(pool_timed_out())
    }

    async fn save(&self, _product: &Product) -> Result<Product> {
        Err(pool_timed_out())
    }

    async fn delete(&self, _id: i32) -> Result<bool> {
        Err(pool_timed_out())
    }

    async fn check_health(&self) -> Result<()> {
        Err(pool_timed_out())
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

/// Hand-built `multipart/form-data` body.
pub struct MultipartForm {
    boundary: String,
    buf: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: "----product-api-test-boundary".to_string(),
            buf: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    /// A field part (no filename) that still declares a content type.
    pub fn typed_text(mut self, name: &str, content_type: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\nContent-Type: {}\r\n\r\n{}\r\n",
                self.boundary, name, content_type, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.buf,
        )
    }
}

pub fn widget_form() -> MultipartForm {
    MultipartForm::new()
        .text("name", "Widget")
        .text("description", "d")
        .text("price", "9.99")
}
