use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use torrhub_core::{ConnectionState, EngineStatus};
use tracing::info;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub connection: ConnectionState,
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = state.engine();
    let (status, code) = if engine.is_accepting() {
        ("ok", StatusCode::OK)
    } else {
        ("shutting_down", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            connection: engine.connection_state(),
        }),
    )
}

#[derive(Serialize)]
pub struct ServerStatusResponse {
    pub version: &'static str,
    pub read_only: bool,
    #[serde(flatten)]
    pub engine: EngineStatus,
}

/// Session and catalog counters for operators.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ServerStatusResponse> {
    Json(ServerStatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        read_only: state.config().read_only,
        engine: state.engine().status().await,
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub status: String,
}

/// Stop the engine and ask the server to exit.
pub async fn shutdown(State(state): State<Arc<AppState>>) -> Json<ShutdownResponse> {
    info!("Shutdown requested over the API");
    state.engine().shutdown().await;
    state.request_shutdown();

    Json(ShutdownResponse {
        status: "shutting_down".to_string(),
    })
}
