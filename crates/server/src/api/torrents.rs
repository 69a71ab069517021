//! Torrent API handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use torrhub_core::{InfoHash, TorrentRecord, TorrentSpec};
use tracing::debug;

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TorrentAction {
    Add,
    Get,
    Set,
    #[serde(rename = "rem")]
    Remove,
    #[serde(rename = "drop")]
    Detach,
    List,
}

#[derive(Debug, Deserialize)]
pub struct TorrentRequest {
    pub action: TorrentAction,
    /// Magnet link or bare info hash (add)
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub data: String,
    /// Persist to the catalog once metadata resolves (add)
    #[serde(default)]
    pub save_to_db: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PreloadResponse {
    pub hash: InfoHash,
    pub file_index: usize,
    pub bytes: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Action-dispatched torrent endpoint.
pub async fn torrents(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TorrentRequest>,
) -> Result<Response, ApiError> {
    let engine = state.engine();

    match request.action {
        TorrentAction::Add => {
            if request.link.is_empty() {
                return Err(ApiError::bad_request("link is required"));
            }
            let spec = TorrentSpec::parse_link(&request.link)?;
            let hash = spec.info_hash.clone();
            let record = engine
                .add_or_update(spec, &request.title, &request.poster, &request.data)
                .await?;
            if request.save_to_db {
                engine.save_when_ready(&hash);
            }
            Ok(Json(record).into_response())
        }
        TorrentAction::Get => {
            let hash = parse_hash(&request.hash)?;
            let record = engine
                .get_by_hash(&hash)
                .await
                .ok_or_else(|| not_found(&hash))?;
            Ok(Json(record).into_response())
        }
        TorrentAction::Set => {
            let hash = parse_hash(&request.hash)?;
            let record = engine
                .set_metadata(&hash, &request.title, &request.poster, &request.data)
                .await
                .ok_or_else(|| not_found(&hash))?;
            Ok(Json(record).into_response())
        }
        TorrentAction::Remove => {
            let hash = parse_hash(&request.hash)?;
            engine.remove(&hash).await?;
            Ok(StatusResponse::ok().into_response())
        }
        TorrentAction::Detach => {
            let hash = parse_hash(&request.hash)?;
            engine.detach(&hash).await?;
            Ok(StatusResponse::ok().into_response())
        }
        TorrentAction::List => {
            let records: Vec<TorrentRecord> = engine.list().await;
            Ok(Json(records).into_response())
        }
    }
}

/// Add a torrent from an uploaded .torrent file.
///
/// Multipart fields: `file` (required), `title`, `poster`, `data`, `save`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TorrentRecord>, ApiError> {
    let mut torrent_data: Option<Vec<u8>> = None;
    let mut title = String::new();
    let mut poster = String::new();
    let mut data = String::new();
    let mut save = false;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => match field.bytes().await {
                Ok(bytes) => torrent_data = Some(bytes.to_vec()),
                Err(e) => {
                    return Err(ApiError::bad_request(format!(
                        "Failed to read file: {}",
                        e
                    )))
                }
            },
            "title" => {
                if let Ok(text) = field.text().await {
                    title = text;
                }
            }
            "poster" => {
                if let Ok(text) = field.text().await {
                    poster = text;
                }
            }
            "data" => {
                if let Ok(text) = field.text().await {
                    data = text;
                }
            }
            "save" => {
                if let Ok(text) = field.text().await {
                    save = matches!(text.as_str(), "true" | "1" | "on");
                }
            }
            _ => {}
        }
    }

    let bytes = match torrent_data {
        Some(d) if !d.is_empty() => d,
        _ => return Err(ApiError::bad_request("No torrent file provided")),
    };

    let spec = TorrentSpec::from_torrent_bytes(&bytes)?;
    let hash = spec.info_hash.clone();
    debug!(hash = %hash, size = bytes.len(), "Received torrent upload");

    let engine = state.engine();
    let record = engine.add_or_update(spec, &title, &poster, &data).await?;
    if save {
        engine.save_when_ready(&hash);
    }

    Ok(Json(record))
}

/// Read ahead the start of one file of a live torrent.
pub async fn preload(
    State(state): State<Arc<AppState>>,
    Path((hash, file_index)): Path<(String, usize)>,
) -> Result<Json<PreloadResponse>, ApiError> {
    let hash = parse_hash(&hash)?;
    let bytes = state.engine().preload(&hash, file_index).await?;

    Ok(Json(PreloadResponse {
        hash,
        file_index,
        bytes,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_hash(raw: &str) -> Result<InfoHash, ApiError> {
    if raw.is_empty() {
        return Err(ApiError::bad_request("hash is required"));
    }
    Ok(InfoHash::parse(raw)?)
}

fn not_found(hash: &InfoHash) -> ApiError {
    ApiError::not_found(format!("Torrent not found: {}", hash))
}
