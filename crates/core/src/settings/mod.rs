//! Settings store - durable runtime swarm settings.

mod sqlite;
mod types;

pub use sqlite::SqliteSettingsStore;
pub use types::*;

/// Trait for settings storage.
pub trait SettingsStore: Send + Sync {
    /// Settings currently in effect.
    fn current(&self) -> BtSettings;

    /// Whether writes are refused.
    fn is_read_only(&self) -> bool;

    /// Persist `settings` and make them current.
    fn save(&self, settings: &BtSettings) -> Result<(), SettingsError>;

    /// Persist the default settings and return them.
    fn reset_to_default(&self) -> Result<BtSettings, SettingsError>;

    /// Release the underlying storage.
    fn close(&self) -> Result<(), SettingsError>;
}
