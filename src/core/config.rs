//! Application configuration
//!
//! TOML configuration with serde-backed defaults. The configuration file is
//! optional: every field has a default matching a stock GVM installation, so
//! a missing file yields a fully usable `Config`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub engine: EngineConfig,
    pub scan: ScanConfig,
    pub enrich: EnrichConfig,
}

/// Connection settings for the external scan engine CLI
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// GMP CLI executable used to talk to the engine
    pub cli_path: PathBuf,
    /// Unix socket the engine daemon listens on
    pub socket_path: PathBuf,
    pub username: String,
    pub password: String,
    /// Port list attached to newly created targets
    pub port_list_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cli_path: PathBuf::from("gvm-cli"),
            socket_path: PathBuf::from("/run/gvmd/gvmd.sock"),
            username: String::new(),
            password: String::new(),
            port_list_id: "4a4717fe-57d2-11e1-9a26-406186ea4fc5".to_string(),
        }
    }
}

/// Scan orchestration settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Scan configuration resolved by name on the engine
    pub config_name: String,
    /// Report format resolved by name on the engine
    pub report_format_name: String,
    /// Seconds between watcher status polls
    pub poll_interval_secs: u64,
    /// Polls before the watcher gives up and reports TimedOut
    pub max_poll_attempts: u32,
    /// Directory holding enriched per-target reports
    pub result_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            config_name: "Full and fast".to_string(),
            report_format_name: "CSV Results".to_string(),
            poll_interval_secs: 10,
            // 24 hours at the default poll interval
            max_poll_attempts: 8640,
            result_dir: PathBuf::from("scan_results"),
        }
    }
}

/// Enrichment pipeline settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
    /// Optional CVE lookup corpus; enrichment falls back to fixed defaults
    /// when the file does not exist
    pub lookup_path: PathBuf,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            lookup_path: PathBuf::from("checkup_database/lookup_corpus.csv"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

impl Config {
    /// Load configuration from an explicit path, or from the default
    /// location if one exists there. No file at the default location is not
    /// an error; the built-in defaults are used instead.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Default config file location under the user's config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vulnwatch").join("config.toml"))
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
