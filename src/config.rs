use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{LogFormat, LoggingConfig};

pub const ENV_REENTRANCY: &str = "MEDIATOR_REENTRANCY";
pub const ENV_LOG_LEVEL: &str = "MEDIATOR_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "MEDIATOR_LOG_FORMAT";

/// What `publish` does when a handler publishes on the bus delivering to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReentrancyMode {
    /// Deliver to a snapshot of the handlers taken when `publish` started.
    /// Nested publishes run to completion; handlers subscribed meanwhile
    /// only see later publishes.
    #[default]
    Snapshot,
    /// Fail a nested publish on the same thread with `BusError::ReentrantPublish`.
    Reject,
}

impl std::str::FromStr for ReentrancyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(ReentrancyMode::Snapshot),
            "reject" => Ok(ReentrancyMode::Reject),
            other => Err(ConfigError::InvalidValue {
                key: ENV_REENTRANCY,
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub reentrancy: ReentrancyMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bus: BusConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

impl Config {
    /// Parse a JSON document. Missing sections and fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by `MEDIATOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_REENTRANCY) {
            self.bus.reentrancy = mode.parse()?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.logging.format =
                format.parse::<LogFormat>().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_LOG_FORMAT,
                    value: format.clone(),
                })?;
        }
        Ok(())
    }
}
