// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Data directory and configuration management.
//!
//! Everything somna stores lives in one data directory:
//! - `config.toml`: optional settings (remote url, sync tunables)
//! - `dreams.db`: the local store
//! - `sync_queue.json`: operations waiting for the remote
//! - `somna.lock`, `somna.log`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::SyncOptions;

const APP_DIR_NAME: &str = "somna";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "dreams.db";
pub const LOCK_FILE_NAME: &str = "somna.lock";
pub const LOG_FILE_NAME: &str = "somna.log";

/// Configuration stored in `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote backend (optional; without it every change stays queued).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Remote backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket endpoint, `ws://...` or `wss://...`.
    pub url: String,
}

impl RemoteConfig {
    /// Returns an error message if the URL is not a WebSocket URL.
    pub fn validate_url(&self) -> Option<String> {
        if self.url.starts_with("ws://") || self.url.starts_with("wss://") {
            None
        } else {
            Some(format!(
                "invalid remote URL '{}': must be ws:// or wss://",
                self.url
            ))
        }
    }
}

/// Sync tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Upper bound on every remote call, in milliseconds (default: 10000).
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Period of the background wake in `watch`, in seconds (default: 900).
    #[serde(default = "default_background_interval_secs")]
    pub background_interval_secs: u64,
    /// How often `watch` probes the remote for reachability, in seconds (default: 30).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Upload events buffered per observer (default: 64).
    #[serde(default = "default_upload_channel_capacity")]
    pub upload_channel_capacity: usize,
}

fn default_send_timeout_ms() -> u64 {
    10_000
}

fn default_background_interval_secs() -> u64 {
    900
}

fn default_probe_interval_secs() -> u64 {
    30
}

fn default_upload_channel_capacity() -> usize {
    64
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            send_timeout_ms: default_send_timeout_ms(),
            background_interval_secs: default_background_interval_secs(),
            probe_interval_secs: default_probe_interval_secs(),
            upload_channel_capacity: default_upload_channel_capacity(),
        }
    }
}

impl SyncSettings {
    pub fn background_interval(&self) -> Duration {
        Duration::from_secs(self.background_interval_secs.max(1))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

impl From<&SyncSettings> for SyncOptions {
    fn from(settings: &SyncSettings) -> Self {
        SyncOptions {
            send_timeout: Duration::from_millis(settings.send_timeout_ms.max(1)),
            upload_channel_capacity: settings.upload_channel_capacity.max(1),
        }
    }
}

impl Config {
    /// Loads `config.toml` from `data_dir`. A missing file yields the defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Parses and validates a configuration document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse {CONFIG_FILE_NAME}: {e}")))?;
        if let Some(msg) = config.remote.as_ref().and_then(RemoteConfig::validate_url) {
            return Err(Error::Config(msg));
        }
        Ok(config)
    }

    /// Writes the configuration to `data_dir/config.toml`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs::write(data_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.url.as_str())
    }
}

/// Resolves the data directory: `-C` flag, then `SOMNA_DATA_DIR`, then
/// `$XDG_DATA_HOME/somna`, then the platform data directory.
pub fn resolve_data_dir(flag: Option<&Path>) -> Result<PathBuf> {
    pick_data_dir(
        flag.map(Path::to_path_buf),
        env::data_dir(),
        env::xdg_data_home(),
        dirs::data_dir(),
    )
    .ok_or(Error::NoDataDir)
}

fn pick_data_dir(
    flag: Option<PathBuf>,
    somna_data_dir: Option<PathBuf>,
    xdg_data_home: Option<PathBuf>,
    platform: Option<PathBuf>,
) -> Option<PathBuf> {
    flag.or(somna_data_dir)
        .or_else(|| {
            xdg_data_home
                .filter(|p| p.is_absolute())
                .map(|p| p.join(APP_DIR_NAME))
        })
        .or_else(|| platform.map(|p| p.join(APP_DIR_NAME)))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
