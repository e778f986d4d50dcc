//! Configuration management for nbview
//!
//! Handles loading and saving the viewer configuration. Configuration is
//! persisted as JSON in the user's configuration directory; a missing file
//! means defaults.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier used for the configuration directory
pub const APP_ID: &str = "nbview";

/// Name of the configuration file inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Maximum file size to open (in bytes) - 50MB, notebooks embed images
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default maximum height of an output region, in pixels
pub const DEFAULT_MAX_OUTPUT_HEIGHT: u32 = 400;

/// Smallest accepted output region height, in pixels
pub const MIN_OUTPUT_HEIGHT: u32 = 50;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Notebook view configuration
    pub view: ViewConfig,

    /// Embedded preview configuration
    pub embed: EmbedConfig,

    /// File handling configuration
    pub files: FileConfig,
}

impl Config {
    /// Load configuration from the user's configuration directory or return defaults
    pub fn load() -> ConfigResult<Self> {
        let path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        Self::load_from(&path)
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the user's configuration directory
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| ConfigError::DirectoryError)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> ConfigResult<()> {
        if self.view.max_output_height < MIN_OUTPUT_HEIGHT {
            return Err(ConfigError::InvalidValue {
                key: "view.max_output_height".to_string(),
                reason: format!("must be at least {} pixels", MIN_OUTPUT_HEIGHT),
            });
        }
        if self.files.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "files.max_file_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Get the configuration directory path
    pub fn config_dir() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }
}

/// Notebook view configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Maximum height of an output region before it scrolls, in pixels
    pub max_output_height: u32,

    /// Show the line-number gutter next to code cells
    pub show_line_numbers: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_output_height: DEFAULT_MAX_OUTPUT_HEIGHT,
            show_line_numbers: true,
        }
    }
}

/// Embedded preview configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Render cell outputs inside embedded previews
    pub render_outputs: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            render_outputs: true,
        }
    }
}

/// File handling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Maximum file size to open (in bytes)
    pub max_file_size: u64,

    /// Directories to ignore when scanning for notebooks
    pub ignored_directories: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            ignored_directories: vec![
                ".git".to_string(),
                ".ipynb_checkpoints".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
            ],
        }
    }
}
