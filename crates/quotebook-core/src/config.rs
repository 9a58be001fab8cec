//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/quotebook/config.toml)
//! 3. Environment variables (QUOTEBOOK_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::sync::MergePolicy;

/// Environment variable prefix
const ENV_PREFIX: &str = "QUOTEBOOK";

/// Demo feed polled by default
pub const DEFAULT_SYNC_URL: &str = "https://jsonplaceholder.typicode.com/posts?_limit=3";

/// Category given to every quote that comes from the remote feed
pub const DEFAULT_SERVER_CATEGORY: &str = "Server";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote quote feed URL
    #[serde(default = "default_sync_url")]
    pub sync_url: String,

    /// Whether the shell polls the remote feed
    #[serde(default = "default_true")]
    pub sync_enabled: bool,

    /// Seconds between scheduled syncs
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Request timeout for the remote feed, in seconds
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,

    /// How remote quotes are merged into the local list
    #[serde(default)]
    pub merge_policy: MergePolicy,

    /// Category tag assigned to remote quotes
    #[serde(default = "default_server_category")]
    pub server_category: String,

    /// Log file used when QUOTEBOOK_LOG is set (defaults to stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sync_url: default_sync_url(),
            sync_enabled: true,
            sync_interval_secs: default_sync_interval(),
            sync_timeout_secs: default_sync_timeout(),
            merge_policy: MergePolicy::default(),
            server_category: default_server_category(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(config_path: Option<&PathBuf>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Reject values the rest of the program cannot work with
    fn validate(&self) -> Result<()> {
        if self.server_category.trim().is_empty() {
            bail!("server_category cannot be empty");
        }
        if self.sync_interval_secs == 0 {
            bail!("sync_interval_secs must be at least 1");
        }
        if self.sync_timeout_secs == 0 {
            bail!("sync_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.sync_url = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_INTERVAL", ENV_PREFIX)) {
            if let Ok(secs) = val.parse::<u64>() {
                self.sync_interval_secs = secs;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_MERGE_POLICY", ENV_PREFIX)) {
            if let Ok(policy) = val.parse() {
                self.merge_policy = policy;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Set a single value by key, as used by `quotebook config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "sync_url" => {
                self.sync_url = if value.is_empty() || value == "default" {
                    default_sync_url()
                } else {
                    value.to_string()
                };
            }
            "sync_enabled" => {
                self.sync_enabled = value
                    .parse()
                    .context("Invalid value for sync_enabled. Use 'true' or 'false'.")?;
            }
            "sync_interval_secs" => {
                let secs: u64 = value
                    .parse()
                    .context("Invalid value for sync_interval_secs. Use a number of seconds.")?;
                if secs == 0 {
                    bail!("sync_interval_secs must be at least 1");
                }
                self.sync_interval_secs = secs;
            }
            "sync_timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .context("Invalid value for sync_timeout_secs. Use a number of seconds.")?;
                if secs == 0 {
                    bail!("sync_timeout_secs must be at least 1");
                }
                self.sync_timeout_secs = secs;
            }
            "merge_policy" => {
                self.merge_policy = value.parse()?;
            }
            "server_category" => {
                if value.trim().is_empty() {
                    bail!("server_category cannot be empty");
                }
                self.server_category = value.trim().to_string();
            }
            "log_file" => {
                self.log_file = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => {
                bail!(
                    "Unknown configuration key: '{}'\n\
                     Valid keys: data_dir, sync_url, sync_enabled, sync_interval_secs, \
                     sync_timeout_secs, merge_policy, server_category, log_file",
                    key
                );
            }
        }
        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QUOTEBOOK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotebook")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("quotebook.db")
    }

    /// Interval between scheduled syncs
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    /// Timeout for a single fetch of the remote feed
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotebook")
}

fn default_sync_url() -> String {
    DEFAULT_SYNC_URL.to_string()
}

fn default_server_category() -> String {
    DEFAULT_SERVER_CATEGORY.to_string()
}

fn default_sync_interval() -> u64 {
    10
}

fn default_sync_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}
