//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by the in-memory swarm mock and SQLite stores in a temp directory.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use torrhub_core::{
    testing::{ManualClock, MockSessionManager},
    Clock, Config, DatabaseConfig, Engine, SessionManager, SqliteCatalog, SqliteSettingsStore,
    TorrentCatalog,
};
use torrhub_server::state::AppState;

/// Re-export fixtures for test convenience
pub use torrhub_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/torrents", json!({ "action": "list" })).await;
///
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Mock swarm - control metadata resolution and connectivity
    pub sessions: Arc<MockSessionManager>,
    /// Catalog, for seeding saved torrents directly
    pub catalog: Arc<SqliteCatalog>,
    pub clock: Arc<ManualClock>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Refuse settings changes
    pub read_only: bool,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            read_only: test_config.read_only,
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Default::default()
        };

        let sessions = Arc::new(MockSessionManager::new());
        let catalog = Arc::new(SqliteCatalog::new(&db_path).expect("Failed to create catalog"));
        let settings = Arc::new(
            SqliteSettingsStore::new(&db_path, test_config.read_only)
                .expect("Failed to create settings store"),
        );
        let clock = Arc::new(ManualClock::new());

        let engine = Engine::new(
            Arc::clone(&sessions) as Arc<dyn SessionManager>,
            Arc::clone(&catalog) as Arc<dyn TorrentCatalog>,
            settings,
            Arc::clone(&clock) as Arc<dyn Clock>,
            &config.engine,
        );

        let state = Arc::new(AppState::new(config, engine));
        let router = torrhub_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            sessions,
            catalog,
            clock,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body.as_bytes().to_vec(), "application/json")
            .await
    }

    /// Send a multipart/form-data POST. Each part is `(name, filename, bytes)`.
    pub async fn post_multipart(
        &self,
        path: &str,
        parts: &[(&str, Option<&str>, &[u8])],
    ) -> TestResponse {
        const BOUNDARY: &str = "torrhub-test-boundary";

        let mut body = Vec::new();
        for (name, filename, bytes) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/x-bittorrent\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.request_raw("POST", path, body, &content_type).await
    }

    /// Send a request with raw body and custom content type.
    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Send a raw GET and return the body as text (for non-JSON endpoints).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }
}

/// A minimal single-file .torrent named `test.bin`.
pub fn sample_torrent() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"d4:infod6:lengthi1024e4:name8:test.bin");
    bytes.extend_from_slice(b"12:piece lengthi16384e6:pieces20:");
    bytes.extend_from_slice(&[b'a'; 20]);
    bytes.extend_from_slice(b"ee");
    bytes
}
