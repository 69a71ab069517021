pub mod catalog;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod session;
pub mod settings;
pub mod testing;

pub use catalog::{CatalogError, CatalogRecord, SqliteCatalog, TorrentCatalog};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    EngineConfig, ServerConfig,
};
pub use engine::{
    preload_budget, Clock, ConnectionState, Engine, EngineError, EngineStatus, RecordSource,
    RecordStatus, SettingsOutcome, SystemClock, TorrentRecord,
};
pub use session::{
    InfoHash, LibrqbitSessionManager, LiveSession, SessionError, SessionManager, SpecError,
    SpecSource, TorrentSpec,
};
pub use settings::{BtSettings, SettingsError, SettingsStore, SqliteSettingsStore};
