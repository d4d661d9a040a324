// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_host() -> String {
    // Bind all interfaces, like the empty-host bind of classic BSD sockets.
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12800
}

fn default_backlog() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The address the listening socket binds to.
    pub host: String,
    /// The TCP port the server listens on.
    pub port: u16,
    /// The listen backlog for not-yet-accepted connections.
    pub backlog: u32,
    /// The default log level, overridable via `RUST_LOG`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from `path` if the file exists, otherwise
    /// falls back to the built-in defaults so the server runs with no
    /// configuration file at all.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validates the resolved configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.backlog == 0 {
            return Err(anyhow!("backlog cannot be 0"));
        }
        Ok(())
    }
}
