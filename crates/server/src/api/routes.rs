use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, settings, torrents};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and lifecycle
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/shutdown", post(handlers::shutdown))
        // Torrents
        .route("/torrents", post(torrents::torrents))
        .route("/torrents/upload", post(torrents::upload))
        .route("/torrents/{hash}/preload/{index}", get(torrents::preload))
        // Settings
        .route("/settings", post(settings::settings));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
