//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$GITOVERLAY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitoverlay/config.toml`
//! 3. `~/.gitoverlay/config.toml`
//!
//! Missing files are not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use gitoverlay::core::config::Config;
//!
//! let result = Config::load().unwrap();
//! println!("overlay entry: {}", result.config.overlay.entry_name);
//! ```

pub mod schema;

pub use schema::OverlayConfig;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GITOVERLAY_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path the configuration was read from, if any.
    pub path: Option<PathBuf>,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub overlay: OverlayConfig,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load() -> Result<ConfigLoadResult, ConfigError> {
        match Self::find() {
            Some(path) => Self::load_from(&path),
            None => Ok(ConfigLoadResult {
                config: Config::default(),
                path: None,
            }),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let overlay = Self::read_overlay_config(path)?;
        overlay.validate()?;
        Ok(ConfigLoadResult {
            config: Config { overlay },
            path: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file.
    fn find() -> Option<PathBuf> {
        // 1. Check $GITOVERLAY_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/gitoverlay/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitoverlay/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.gitoverlay/config.toml
        dirs::home_dir()
            .map(|home| home.join(".gitoverlay/config.toml"))
            .filter(|path| path.exists())
    }

    fn read_overlay_config(path: &Path) -> Result<OverlayConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
