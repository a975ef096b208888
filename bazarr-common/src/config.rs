//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "BAZARR_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "bazarr.db";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6767,
        }
    }
}

/// Notification channel settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// SSE event queue and websocket broadcast capacity
    pub event_queue_capacity: usize,
    /// UI toast queue capacity
    pub toast_queue_capacity: usize,
    /// Interval between SSE keep-alive comments
    pub sse_keep_alive_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: crate::hub::DEFAULT_EVENT_CAPACITY,
            toast_queue_capacity: crate::hub::DEFAULT_TOAST_CAPACITY,
            sse_keep_alive_secs: 15,
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub root_folder: Option<PathBuf>,
    pub server: ServerConfig,
    pub events: EventsConfig,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    pub server: ServerConfig,
    pub events: EventsConfig,
}

impl Config {
    /// Resolve configuration from CLI, environment, TOML file and defaults
    ///
    /// An explicitly given config file must exist; the platform default file
    /// is optional.
    pub fn load(cli_root_folder: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                load_config_file(path)?
            }
            None => match default_config_path() {
                Some(path) => {
                    info!("Loading config file: {}", path.display());
                    load_config_file(&path)?
                }
                None => {
                    debug!("No config file found, using defaults");
                    ConfigFile::default()
                }
            },
        };

        let root_folder = resolve_root_folder(cli_root_folder, ROOT_FOLDER_ENV, &file);
        let config = Self {
            root_folder,
            server: file.server,
            events: file.events,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.events.event_queue_capacity == 0 {
            return Err(Error::Config(
                "events.event_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.events.toast_queue_capacity == 0 {
            return Err(Error::Config(
                "events.toast_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.events.sse_keep_alive_secs == 0 {
            return Err(Error::Config(
                "events.sse_keep_alive_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the SQLite database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Parse a TOML config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_file: &ConfigFile,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config_file.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// First existing platform config file, if any
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("bazarr").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/bazarr/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/bazarr (or /var/lib/bazarr for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("bazarr"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/bazarr"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/bazarr
        dirs::data_dir()
            .map(|d| d.join("bazarr"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/bazarr"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\bazarr
        dirs::data_local_dir()
            .map(|d| d.join("bazarr"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\bazarr"))
    } else {
        PathBuf::from("./bazarr_data")
    }
}
