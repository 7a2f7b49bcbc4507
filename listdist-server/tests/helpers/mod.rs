//! Test Helper Utilities
//!
//! Shared utilities for testing listdist-server

#![allow(dead_code)]

pub mod fixtures;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use listdist_server::db::agents::{create_agent, NewAgent};
use listdist_server::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::Path;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub use fixtures::{build_xlsx, multipart_body, Cell, Part, BOUNDARY};

/// App wired to an in-memory database and a scratch uploads directory
///
/// Keep the `TempDir` alive for the duration of the test.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(1024 * 1024, None).await
    }

    pub async fn with_options(max_upload_bytes: u64, api_token: Option<&str>) -> Self {
        let pool = listdist_common::db::init_memory_database()
            .await
            .expect("Failed to create in-memory database");
        let uploads = tempfile::tempdir().expect("Failed to create uploads dir");

        let state = AppState::new(
            pool.clone(),
            uploads.path().to_path_buf(),
            max_upload_bytes,
            api_token.map(String::from),
        );

        Self {
            router: build_router(state),
            pool,
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// POST a single `file` part
    pub async fn upload(&self, file_name: &str, content_type: &str, content: &[u8]) -> Response<Body> {
        let body = multipart_body(&[Part::file("file", file_name, content_type, content)]);
        self.send(upload_request(body, None)).await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub fn uploads_is_empty(&self) -> bool {
        dir_is_empty(self.uploads.path())
    }
}

pub fn upload_request(body: Vec<u8>, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register agents `Agent 0..n` in order
pub async fn seed_agents(pool: &SqlitePool, names: &[&str]) {
    for (i, name) in names.iter().enumerate() {
        create_agent(
            pool,
            &NewAgent {
                name: name.to_string(),
                email: format!("agent{}@example.com", i),
                mobile: format!("555-000{}", i),
                password: "secret1".to_string(),
            },
        )
        .await
        .expect("Failed to seed agent");
    }
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
