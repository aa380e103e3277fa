//! Server configuration loaded from TOML.
//!
//! ```toml
//! bind = "0.0.0.0:27016"
//! host_name = "$H"
//! character_dir = "characters"
//! idle_timeout_secs = 15
//!
//! [credentials]
//! mod_password = "..."
//! cm_password = "..."
//! gm_password = "..."
//! daily_gm_passwords = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
//! ```

use std::path::{Path, PathBuf};

use bailiff_auth::{AuthError, CredentialSet, DEFAULT_HOST_NAME};
use serde::Deserialize;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid credentials: {0}")]
    Invalid(#[from] AuthError),
}

/// Everything the server needs to start.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Sender name on server OOC replies.
    #[serde(default = "default_host_name")]
    pub host_name: String,
    /// Directory holding one subdirectory per character.
    #[serde(default = "default_character_dir")]
    pub character_dir: PathBuf,
    /// Seconds a client may stay silent before it is dropped.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Staff secrets.
    pub credentials: CredentialSet,
}

impl ServerConfig {
    /// Reads and validates a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.credentials.validate()?;
        Ok(config)
    }
}

fn default_bind() -> String {
    "127.0.0.1:27016".to_string()
}

fn default_host_name() -> String {
    DEFAULT_HOST_NAME.to_string()
}

fn default_character_dir() -> PathBuf {
    PathBuf::from("characters")
}

fn default_idle_timeout_secs() -> u64 {
    crate::server::DEFAULT_IDLE_TIMEOUT.as_secs()
}
