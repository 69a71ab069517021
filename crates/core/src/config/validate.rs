use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Engine durations are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Engine validation
    let engine = &config.engine;
    for (name, value) in [
        ("engine.expiry_grace_secs", engine.expiry_grace_secs),
        ("engine.sweep_interval_secs", engine.sweep_interval_secs),
        ("engine.metadata_timeout_secs", engine.metadata_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be 0",
                name
            )));
        }
    }

    Ok(())
}
