use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Refuse settings changes; the stored settings are used as-is.
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8090
}

/// Database configuration
///
/// The catalog and the swarm settings share one SQLite file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("torrhub.db")
}

/// Lifecycle engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// How long an untouched live session survives, in seconds.
    #[serde(default = "default_expiry_grace_secs")]
    pub expiry_grace_secs: u64,
    /// How often the idle sweeper runs, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// How long to wait for torrent metadata, in seconds.
    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,
}

impl EngineConfig {
    pub fn expiry_grace(&self) -> Duration {
        Duration::from_secs(self.expiry_grace_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expiry_grace_secs: default_expiry_grace_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            metadata_timeout_secs: default_metadata_timeout_secs(),
        }
    }
}

fn default_expiry_grace_secs() -> u64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    10
}

fn default_metadata_timeout_secs() -> u64 {
    60
}
