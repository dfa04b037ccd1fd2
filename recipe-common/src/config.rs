//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (handled by the CLI parser)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Everything here is bootstrap-only: changing the TOML file requires a restart.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "recipe-api";

/// Default HTTP host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default URL prefix for uploaded media
pub const DEFAULT_MEDIA_URL: &str = "/media";

/// Default number of database connection attempts at startup
pub const DEFAULT_DB_CONNECT_ATTEMPTS: u32 = 10;

/// Bootstrap configuration loaded from a TOML file
///
/// Every key is optional; missing keys fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP bind host
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP port
    #[serde(default)]
    pub port: Option<u16>,

    /// Directory uploaded images are written to
    #[serde(default)]
    pub media_root: Option<PathBuf>,

    /// URL prefix media is served under
    #[serde(default)]
    pub media_url: Option<String>,

    /// Connection attempts (1 second apart) before giving up on the database
    #[serde(default)]
    pub db_connect_attempts: Option<u32>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line (or via environment variables)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub media_root: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub media_root: PathBuf,
    pub media_url: String,
    pub db_connect_attempts: u32,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve configuration from overrides, the TOML file and defaults
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match &overrides.config_file {
            Some(path) => load_toml_config(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => load_toml_config(&path)?,
                None => TomlConfig::default(),
            },
        };

        Ok(Self::merge(overrides, toml_config, &default_data_dir()))
    }

    /// Merge overrides over TOML values over defaults rooted at `data_dir`
    pub fn merge(overrides: ConfigOverrides, toml_config: TomlConfig, data_dir: &Path) -> Self {
        Self {
            host: overrides
                .host
                .or(toml_config.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or(toml_config.database_path)
                .unwrap_or_else(|| data_dir.join("recipe.db")),
            media_root: overrides
                .media_root
                .or(toml_config.media_root)
                .unwrap_or_else(|| data_dir.join("media")),
            media_url: normalize_media_url(
                toml_config.media_url.as_deref().unwrap_or(DEFAULT_MEDIA_URL),
            ),
            db_connect_attempts: toml_config
                .db_connect_attempts
                .unwrap_or(DEFAULT_DB_CONNECT_ATTEMPTS)
                .max(1),
            log_level: toml_config.logging.level,
        }
    }

    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Platform config file location (`~/.config/recipe-api/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/recipe-api (or /var/lib/recipe-api for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib").join(APP_DIR_NAME))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/recipe-api
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support").join(APP_DIR_NAME))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\recipe-api
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData").join(APP_DIR_NAME))
    } else {
        PathBuf::from("./recipe_data")
    }
}

/// Force a leading slash and strip trailing slashes (`media/` → `/media`)
pub fn normalize_media_url(url: &str) -> String {
    let trimmed = url.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_MEDIA_URL.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
