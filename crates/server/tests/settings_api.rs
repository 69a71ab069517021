//! API tests for runtime swarm settings.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use torrhub_core::BtSettings;

use common::{TestConfig, TestFixture};

#[tokio::test]
async fn test_get_settings_returns_defaults() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/settings", json!({ "action": "get" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["settings"],
        serde_json::to_value(BtSettings::default()).unwrap()
    );
    assert_eq!(response.body["read_only"], false);
    assert_eq!(response.body["connection"], "connected");
    assert!(response.body.get("outcome").is_none());
}

#[tokio::test]
async fn test_set_settings_reconnects_swarm() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/settings",
            json!({
                "action": "set",
                "sets": { "cache_capacity_bytes": 1048576, "enable_dht": false }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "applied");
    assert_eq!(response.body["settings"]["cache_capacity_bytes"], 1048576);
    assert_eq!(response.body["settings"]["enable_dht"], false);
    assert_eq!(response.body["connection"], "connected");

    assert_eq!(fixture.sessions.disconnect_count(), 1);
    assert_eq!(fixture.sessions.reconnect_count(), 1);
    let applied = fixture.sessions.last_settings().await.unwrap();
    assert_eq!(applied.cache_capacity_bytes, 1048576);
    assert!(!applied.enable_dht);

    // Persisted
    let response = fixture
        .post("/api/v1/settings", json!({ "action": "get" }))
        .await;
    assert_eq!(response.body["settings"]["cache_capacity_bytes"], 1048576);
}

#[tokio::test]
async fn test_set_settings_clamps_read_ahead() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/settings",
            json!({ "action": "set", "sets": { "read_ahead_percent": 250.0 } }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["settings"]["read_ahead_percent"], 100.0);
}

#[tokio::test]
async fn test_set_settings_requires_sets() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/settings", json!({ "action": "set" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.sessions.disconnect_count(), 0);
}

#[tokio::test]
async fn test_reset_settings_to_default() {
    let fixture = TestFixture::new().await;
    fixture
        .post(
            "/api/v1/settings",
            json!({ "action": "set", "sets": { "enable_dht": false } }),
        )
        .await;

    let response = fixture
        .post("/api/v1/settings", json!({ "action": "def" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "applied");
    assert_eq!(response.body["settings"]["enable_dht"], true);
    assert_eq!(fixture.sessions.reconnect_count(), 2);
}

#[tokio::test]
async fn test_read_only_settings_are_untouched() {
    let fixture = TestFixture::with_config(TestConfig { read_only: true }).await;

    let response = fixture
        .post(
            "/api/v1/settings",
            json!({ "action": "set", "sets": { "enable_dht": false } }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "read_only");
    assert_eq!(response.body["read_only"], true);
    assert_eq!(response.body["settings"]["enable_dht"], true);
    assert_eq!(fixture.sessions.disconnect_count(), 0);
}

#[tokio::test]
async fn test_failed_reconnect_leaves_swarm_disconnected() {
    let fixture = TestFixture::new().await;
    fixture.sessions.set_fail_reconnect(true);

    let response = fixture
        .post(
            "/api/v1/settings",
            json!({ "action": "set", "sets": { "enable_dht": false } }),
        )
        .await;
    assert!(response.status.is_server_error());

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.body["connection"], "disconnected");
}

#[tokio::test]
async fn test_unknown_settings_action_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/settings", json!({ "action": "wipe" }))
        .await;

    assert!(response.status.is_client_error());
}
