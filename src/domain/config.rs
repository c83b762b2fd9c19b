//! Config - Panel Configuration
//!
//! Persisted as TOML in the platform config directory. The API key is encrypted at
//! rest; plaintext keys written by hand are accepted and encrypted on next save.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{
    CONNECT_SETTLE_DELAY_MS, DEFAULT_API_PREFIX, DEFAULT_BASE_URL, DEFAULT_ROWS_PER_PAGE,
    REQUEST_TIMEOUT_SECS, SEARCH_DEBOUNCE_MS, TRANSITION_TIMEOUT_SECS, TUNNEL_POLL_INTERVAL_SECS,
};
use crate::error::Result;
use crate::helpers::{decrypt, encrypt, get_or_create_config_dir};

const CONFIG_FILE: &str = "cloud-connect-panel.toml";

/// Main panel configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    pub server: ServerConfig,
    pub refresh: RefreshConfig,
    pub table: TableConfig,
    pub logging: LoggingConfig,
}

/// Remote server connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server root, e.g. `https://lnbits.example.com`
    pub base_url: String,
    /// Extension route prefix
    pub api_prefix: String,
    /// Invoice/admin key sent as `X-Api-Key`
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            api_key: None,
            timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Background refresh timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    pub poll_interval_secs: u64,
    pub connect_settle_delay_ms: u64,
    /// 0 = fetch immediately on every search change
    pub search_debounce_ms: u64,
    /// 0 = do not track pending transitions
    pub transition_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: TUNNEL_POLL_INTERVAL_SECS,
            connect_settle_delay_ms: CONNECT_SETTLE_DELAY_MS,
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
            transition_timeout_secs: TRANSITION_TIMEOUT_SECS,
        }
    }
}

impl RefreshConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn connect_settle_delay(&self) -> Duration {
        Duration::from_millis(self.connect_settle_delay_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn transition_timeout(&self) -> Option<Duration> {
        (self.transition_timeout_secs > 0).then(|| Duration::from_secs(self.transition_timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableConfig {
    pub rows_per_page: u32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

/// Logging output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `cloud_connect_panel=debug`
    pub level: String,
    /// Also write a daily-rolling log file in the data directory
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
        }
    }
}

impl PanelConfig {
    /// Default config file location, created empty if missing
    pub fn default_path() -> Result<PathBuf> {
        let path = get_or_create_config_dir()?.join(CONFIG_FILE);
        if !path.exists() {
            std::fs::write(&path, "")?;
        }
        Ok(path)
    }

    /// Load from the default location and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        info!(path = ?path, "Loading config file");
        let value = std::fs::read_to_string(path)?;
        if value.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: PanelConfig = toml::from_str(&value)?;
        if let Some(key) = &config.server.api_key {
            // Hand-edited files may hold the key in plaintext
            config.server.api_key = Some(decrypt(key).unwrap_or_else(|_| key.clone()));
        }
        Ok(config)
    }

    /// Write to the default location, returning the path written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        info!(path = ?path, "Config saved");
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut stored = self.clone();
        if let Some(key) = &self.server.api_key {
            if !key.is_empty() {
                stored.server.api_key = Some(encrypt(key)?);
            }
        }
        let content = toml::to_string_pretty(&stored)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `PANEL_BASE_URL`, `PANEL_API_KEY` and `PANEL_LOG`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PANEL_BASE_URL").filter(|v| !v.is_empty()) {
            self.server.base_url = url;
        }
        if let Some(key) = lookup("PANEL_API_KEY").filter(|v| !v.is_empty()) {
            self.server.api_key = Some(key);
        }
        if let Some(level) = lookup("PANEL_LOG").filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
        if self.table.rows_per_page == 0 {
            warn!("rows_per_page must be positive, using default");
            self.table.rows_per_page = DEFAULT_ROWS_PER_PAGE;
        }
    }

    /// Full URL of an extension route
    pub fn api_url(&self, route: &str) -> String {
        format!(
            "{}/{}/{}",
            self.server.base_url.trim_end_matches('/'),
            self.server.api_prefix.trim_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// Full URL of a server-wide route (outside the extension prefix)
    pub fn server_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.server.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}
