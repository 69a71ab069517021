//! API tests for the torrent endpoints.
//!
//! These run the full router in-process against the in-memory swarm mock
//! and SQLite stores in a temp directory.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio_test::assert_ok;
use torrhub_core::TorrentCatalog;

use common::{fixtures, sample_torrent, TestConfig, TestFixture};

async fn wait_for_catalog(fixture: &TestFixture, hex: &str) -> bool {
    let hash = fixtures::hash(hex);
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(5) {
        if matches!(fixture.catalog.get(&hash), Ok(Some(_))) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["connection"], "connected");
}

#[tokio::test]
async fn test_status_counts_sessions_and_catalog() {
    let fixture = TestFixture::new().await;
    assert_ok!(fixture.catalog.put(&fixtures::catalog_record(
        fixtures::HASH_B,
        "Stored",
        "",
        "",
        1,
    )));
    fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A }),
        )
        .await;

    let response = fixture.get("/api/v1/status").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["read_only"], false);
    assert_eq!(response.body["accepting"], true);
    assert_eq!(response.body["connection"], "connected");
    assert_eq!(response.body["live_sessions"], 1);
    assert_eq!(response.body["catalog_entries"], 1);
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_status_reports_read_only_config() {
    let fixture = TestFixture::with_config(TestConfig { read_only: true }).await;

    let response = fixture.get("/api/v1/status").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["read_only"], true);
    assert_eq!(response.body["settings_read_only"], true);
    assert_eq!(response.body["live_sessions"], 0);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/api/v1/torrents", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/torrents", json!({ "action": "explode" }))
        .await;
    assert!(response.status.is_client_error());
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_add_by_hash() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A, "title": "Big Buck Bunny" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["hash"], fixtures::HASH_A);
    assert_eq!(response.body["title"], "Big Buck Bunny");
    assert_eq!(response.body["source"], "live");
    assert_eq!(fixture.sessions.session_count(), 1);
}

#[tokio::test]
async fn test_add_by_magnet_fills_catalog_fields() {
    let fixture = TestFixture::new().await;
    assert_ok!(fixture.catalog.put(&fixtures::catalog_record(
        fixtures::HASH_B,
        "Saved",
        "poster.jpg",
        "{}",
        100,
    )));

    let magnet = format!("magnet:?xt=urn:btih:{}", fixtures::HASH_B);
    let response = fixture
        .post("/api/v1/torrents", json!({ "action": "add", "link": magnet }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Saved");
    assert_eq!(response.body["poster"], "poster.jpg");
    assert_eq!(response.body["source"], "merged");
}

#[tokio::test]
async fn test_add_requires_link() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/torrents", json!({ "action": "add" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": "http://example.com/file.torrent" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_add_with_save_to_db_persists() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({
                "action": "add",
                "link": fixtures::HASH_A,
                "title": "Keep Me",
                "save_to_db": true
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    assert!(wait_for_catalog(&fixture, fixtures::HASH_A).await);
    let stored = fixture
        .catalog
        .get(&fixtures::hash(fixtures::HASH_A))
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Keep Me");
}

#[tokio::test]
async fn test_add_when_swarm_disconnected_is_unavailable() {
    let fixture = TestFixture::new().await;
    fixture
        .sessions
        .set_next_error(torrhub_core::SessionError::Disconnected)
        .await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A }),
        )
        .await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Get / Set / List
// =============================================================================

#[tokio::test]
async fn test_get_unknown_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "get", "hash": fixtures::HASH_C }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_invalid_hash_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/torrents", json!({ "action": "get", "hash": "xyz" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post("/api/v1/torrents", json!({ "action": "get" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_catalog_only_returns_stand_in() {
    let fixture = TestFixture::new().await;
    assert_ok!(fixture.catalog.put(&fixtures::catalog_record(
        fixtures::HASH_A,
        "Stored",
        "",
        "",
        42,
    )));

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "get", "hash": fixtures::HASH_A }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Stored");
    assert_eq!(response.body["source"], "catalog");
    assert_eq!(response.body["status"], "stored");
    assert_eq!(response.body["timestamp"], 42);
}

#[tokio::test]
async fn test_set_updates_live_record() {
    let fixture = TestFixture::new().await;
    fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A, "title": "Old" }),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({
                "action": "set",
                "hash": fixtures::HASH_A,
                "title": "New",
                "poster": "p.png",
                "data": "{\"season\":1}"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "New");
    assert_eq!(response.body["poster"], "p.png");
    assert_eq!(response.body["data"], "{\"season\":1}");
}

#[tokio::test]
async fn test_set_unknown_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "set", "hash": fixtures::HASH_A, "title": "X" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders_newest_first() {
    let fixture = TestFixture::new().await;
    for (hex, title, ts) in [
        (fixtures::HASH_A, "Alpha", 10),
        (fixtures::HASH_B, "Bravo", 30),
        (fixtures::HASH_C, "Charlie", 20),
    ] {
        assert_ok!(fixture
            .catalog
            .put(&fixtures::catalog_record(hex, title, "", "", ts)));
    }

    let response = fixture
        .post("/api/v1/torrents", json!({ "action": "list" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let titles: Vec<_> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Bravo", "Charlie", "Alpha"]);
}

#[tokio::test]
async fn test_list_empty() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/torrents", json!({ "action": "list" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

// =============================================================================
// Remove / Drop
// =============================================================================

#[tokio::test]
async fn test_remove_deletes_everywhere() {
    let fixture = TestFixture::new().await;
    assert_ok!(fixture.catalog.put(&fixtures::catalog_record(
        fixtures::HASH_A,
        "Gone",
        "",
        "",
        1,
    )));
    fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A }),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "rem", "hash": fixtures::HASH_A }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");

    assert_eq!(fixture.sessions.session_count(), 0);
    assert!(fixture
        .catalog
        .get(&fixtures::hash(fixtures::HASH_A))
        .unwrap()
        .is_none());

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "get", "hash": fixtures::HASH_A }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_drop_keeps_catalog_entry() {
    let fixture = TestFixture::new().await;
    assert_ok!(fixture.catalog.put(&fixtures::catalog_record(
        fixtures::HASH_A,
        "Kept",
        "",
        "",
        1,
    )));
    fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A }),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "drop", "hash": fixtures::HASH_A }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    assert_eq!(fixture.sessions.session_count(), 0);
    let stored = fixture
        .catalog
        .get(&fixtures::hash(fixtures::HASH_A))
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Kept");
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_torrent_file() {
    let fixture = TestFixture::new().await;
    let torrent = sample_torrent();

    let response = fixture
        .post_multipart(
            "/api/v1/torrents/upload",
            &[
                ("file", Some("test.torrent"), torrent.as_slice()),
                ("title", None, b"Uploaded".as_slice()),
                ("poster", None, b"cover.jpg".as_slice()),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Uploaded");
    assert_eq!(response.body["poster"], "cover.jpg");
    assert_eq!(response.body["hash"].as_str().unwrap().len(), 40);
    assert_eq!(fixture.sessions.session_count(), 1);
}

#[tokio::test]
async fn test_upload_without_file_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_multipart("/api/v1/torrents/upload", &[("title", None, b"Nothing".as_slice())])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No torrent file provided");
}

#[tokio::test]
async fn test_upload_garbage_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_multipart(
            "/api/v1/torrents/upload",
            &[("file", Some("bad.torrent"), b"not a torrent".as_slice())],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.sessions.session_count(), 0);
}

// =============================================================================
// Preload
// =============================================================================

#[tokio::test]
async fn test_preload_live_torrent() {
    let fixture = TestFixture::new().await;
    fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A }),
        )
        .await;

    let response = fixture
        .get(&format!("/api/v1/torrents/{}/preload/2", fixtures::HASH_A))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["file_index"], 2);

    let preloads = fixture.sessions.preloads().await;
    assert_eq!(preloads.len(), 1);
    assert_eq!(preloads[0].file_index, 2);
    assert_eq!(response.body["bytes"], preloads[0].budget);
}

#[tokio::test]
async fn test_preload_unknown_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get(&format!("/api/v1/torrents/{}/preload/0", fixtures::HASH_B))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preload_bad_index_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get(&format!("/api/v1/torrents/{}/preload/first", fixtures::HASH_A))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Shutdown / Metrics
// =============================================================================

#[tokio::test]
async fn test_shutdown_stops_engine() {
    let fixture = TestFixture::new().await;
    fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_A }),
        )
        .await;

    let response = fixture.post("/api/v1/shutdown", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!fixture.state.engine().is_accepting());
    assert!(!fixture.sessions.is_connected());

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    let response = fixture
        .post(
            "/api/v1/torrents",
            json!({ "action": "add", "link": fixtures::HASH_B }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("torrhub_http_requests_total"));
    assert!(body.contains("torrhub_connection_state"));
}
