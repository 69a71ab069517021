use tokio::sync::Notify;
use torrhub_core::{Config, Engine};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: Engine,
    shutdown: Notify,
}

impl AppState {
    pub fn new(config: Config, engine: Engine) -> Self {
        Self {
            config,
            engine,
            shutdown: Notify::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Ask the server to stop accepting connections.
    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once `request_shutdown` has been called.
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }
}
