use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gree::Model;

pub const REPEAT_MIN: u8 = 1;
pub const REPEAT_MAX: u8 = 100;

/// Runtime configuration of one air conditioner. Fixed for the lifetime of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model: Model,
    /// Announce a WiFi module in every frame sent
    pub wifi_function: bool,
    /// Drop received frames whose checksum doesn't match
    pub check_checksum: bool,
    /// Report received remote commands back as state updates
    pub set_modes: bool,
    /// Number of times each command is transmitted
    pub repeat: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Model::Generic,
            wifi_function: false,
            check_checksum: false,
            set_modes: false,
            repeat: 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("repeat must be between 1 and 100, got {0}")]
    InvalidRepeat(u8),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

impl Config {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(REPEAT_MIN..=REPEAT_MAX).contains(&self.repeat) {
            return Err(ConfigError::InvalidRepeat(self.repeat));
        }
        Ok(self)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Config>(json)?.validate()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
