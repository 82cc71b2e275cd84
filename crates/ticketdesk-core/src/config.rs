//! Configuration resolution for `TicketDesk`.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/ticketdesk/settings.json)
//! 3. Environment variables
//! 4. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete `TicketDesk` configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server and storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub database_path: Option<PathBuf>,
    pub max_connections: u32,
    pub log_level: String,
    /// Development mode: session cookies are sent without `Secure`.
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8800".to_string(),
            database_path: None,
            max_connections: 5,
            log_level: "info".to_string(),
            dev_mode: false,
        }
    }
}

/// Session token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Validity window of an issued session token (seconds). Default: 1 day.
    pub ttl_secs: i64,
    pub cookie_name: String,
}

impl Config {
    /// Reject settings the server cannot run with. Call after CLI overrides are applied.
    pub fn validate(&self) -> Result<()> {
        if self.session.ttl_secs <= 0 {
            return Err(Error::Config(format!(
                "session.ttl_secs must be positive, got {}",
                self.session.ttl_secs
            )));
        }
        if self.server.max_connections == 0 {
            return Err(Error::Config(
                "server.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            cookie_name: "token".to_string(),
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config() -> Result<Config> {
    let mut config = match global_config_path() {
        Some(path) if path.exists() => load_config_file(&path)?,
        _ => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("settings.json"))
}

/// Get the default database path.
pub fn database_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("tickets.db"))
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .map(|p| p.join("ticketdesk"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("TICKETDESK_ADDR") {
        config.server.addr = val;
    }
    if let Some(val) = var("TICKETDESK_DATABASE_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = var("TICKETDESK_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Some(n) = var("TICKETDESK_SESSION_TTL_SECS").and_then(|v| v.parse().ok()) {
        config.session.ttl_secs = n;
    }
    if let Some(val) = var("TICKETDESK_DEV") {
        config.server.dev_mode = matches!(val.as_str(), "1" | "true" | "yes");
    }
}
