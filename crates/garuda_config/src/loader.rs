//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{FailurePolicyKind, HarnessConfig};
use std::path::Path;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "harness.toml";

/// Loads and validates a harness configuration from `path`.
pub fn load_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Loads `<dir>/harness.toml` if it exists, otherwise returns the defaults.
pub fn load_config_or_default(dir: &Path) -> Result<HarnessConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.is_file() {
        load_config(&path)
    } else {
        Ok(HarnessConfig::default())
    }
}

/// Parses and validates a harness configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<HarnessConfig, ConfigError> {
    let config: HarnessConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges and cross-field consistency.
///
/// Called by the loaders, and again by callers that patch a loaded config
/// with command-line overrides.
pub fn validate_config(config: &HarnessConfig) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

    if !(8..=64).contains(&config.dut.xlen) {
        return invalid(format!(
            "dut.xlen must be between 8 and 64, got {}",
            config.dut.xlen
        ));
    }
    if config.dut.latency == 0 {
        return invalid("dut.latency must be at least 1".to_string());
    }
    if config.clock.port.is_empty() {
        return invalid("clock.port must not be empty".to_string());
    }
    if config.clock.period_fs < 2 {
        return invalid("clock.period must be at least 2 fs".to_string());
    }
    if config.reset.port.is_empty() {
        return invalid("reset.port must not be empty".to_string());
    }
    if config.reset.port == config.clock.port {
        return invalid(format!(
            "reset.port and clock.port both name '{}'",
            config.clock.port
        ));
    }
    if config.timing.edge_timeout_fs < config.clock.period_fs {
        return invalid("timing.edge_timeout must be at least one clock period".to_string());
    }
    if config.regression.iterations == 0 {
        return invalid("regression.iterations must be at least 1".to_string());
    }
    if config.regression.failure_policy == FailurePolicyKind::Collect
        && config.regression.max_failures == 0
    {
        return invalid(
            "regression.max_failures must be at least 1 with failure_policy = \"collect\""
                .to_string(),
        );
    }
    Ok(())
}
