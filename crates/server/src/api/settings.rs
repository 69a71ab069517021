//! Runtime swarm settings API.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use torrhub_core::{BtSettings, ConnectionState, SettingsOutcome};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsAction {
    Get,
    Set,
    #[serde(rename = "def")]
    Default,
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub action: SettingsAction,
    #[serde(default)]
    pub sets: Option<BtSettings>,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: BtSettings,
    pub read_only: bool,
    pub connection: ConnectionState,
    /// Present for set/def.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SettingsOutcome>,
}

pub async fn settings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let engine = state.engine();

    let outcome = match request.action {
        SettingsAction::Get => None,
        SettingsAction::Set => {
            let sets = request
                .sets
                .ok_or_else(|| ApiError::bad_request("sets is required"))?;
            Some(engine.apply_settings(sets).await?)
        }
        SettingsAction::Default => Some(engine.reset_to_default().await?),
    };

    Ok(Json(SettingsResponse {
        settings: engine.settings(),
        read_only: engine.is_read_only(),
        connection: engine.connection_state(),
        outcome,
    }))
}
