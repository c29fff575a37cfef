use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default refresh interval in milliseconds (1 hour)
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Quiet period after the last filesystem event before a run is triggered (30 seconds)
pub const DEFAULT_DEBOUNCE_MS: u64 = 30_000;

/// Timeout for a single registry lookup in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Timeout for a package manager command in milliseconds (2 minutes)
pub const COMMAND_TIMEOUT_MS: u64 = 120_000;

// =============================================================================
// MacPorts defaults
// =============================================================================

/// Default base URL for the MacPorts ports API
pub const DEFAULT_REGISTRY_URL: &str = "https://ports.macports.org/api/v1";

/// MacPorts keeps its registry database here; any package operation touches it.
pub const DEFAULT_WATCH_DIR: &str = "/opt/local/var/macports/registry";

/// Name of the synthetic record describing the package manager itself
pub const DEFAULT_SELF_PACKAGE_NAME: &str = "macports";

pub const DEFAULT_VERSION_COMMAND: &str = "port version";
pub const DEFAULT_INSTALLED_COMMAND: &str = "port installed requested and active";

/// Log file written under the data directory by `watch`
pub const LOG_FILE_NAME: &str = "port-status.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub registry: RegistryConfig,
    pub commands: CommandsConfig,
    pub inventory: InventoryConfig,
    pub schedule: ScheduleConfig,
    pub log: LogConfig,
}

/// Remote registry configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Upper bound on in-flight lookups; `None` issues every lookup at once
    pub max_concurrent_requests: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
            request_timeout_ms: FETCH_TIMEOUT_MS,
            max_concurrent_requests: None,
        }
    }
}

impl RegistryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Package manager command configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CommandsConfig {
    pub shell: String,
    pub version_command: String,
    pub installed_command: String,
    pub timeout_ms: u64,
    /// Directories prepended to `PATH` for the child process
    pub extra_path: Vec<PathBuf>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            version_command: DEFAULT_VERSION_COMMAND.to_string(),
            installed_command: DEFAULT_INSTALLED_COMMAND.to_string(),
            timeout_ms: COMMAND_TIMEOUT_MS,
            extra_path: vec![
                PathBuf::from("/opt/local/bin"),
                PathBuf::from("/opt/local/sbin"),
            ],
        }
    }
}

impl CommandsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryConfig {
    pub self_package_name: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            self_package_name: DEFAULT_SELF_PACKAGE_NAME.to_string(),
        }
    }
}

/// Scheduling configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleConfig {
    /// Refresh interval in milliseconds
    pub refresh_interval_ms: u64,
    /// Filesystem quiet period in milliseconds
    pub debounce_ms: u64,
    pub watch_dir: PathBuf,
    pub watch: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            watch_dir: PathBuf::from(DEFAULT_WATCH_DIR),
            watch: true,
        }
    }
}

impl ScheduleConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    pub json: bool,
}

impl Config {
    /// Load configuration from an explicit path, or from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for port-status.
/// Uses $XDG_DATA_HOME/port-status if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/port-status,
/// or ./port-status if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("port-status")
        .join("config.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("port-status")
}
