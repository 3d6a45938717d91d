//! Configuration loading, validation, and management for contentsplit.
//!
//! Loads configuration from `~/.contentsplit/config.toml` with environment
//! variable overrides. Validates all settings before use.

use contentsplit_core::{DEFAULT_MAX_LENGTH, LongWordPolicy, SplitOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides `max_length`.
pub const ENV_MAX_LENGTH: &str = "CONTENTSPLIT_MAX_LENGTH";

/// Overrides `output.directory`.
pub const ENV_OUTPUT_DIR: &str = "CONTENTSPLIT_OUTPUT_DIR";

/// The root configuration structure.
///
/// Maps directly to `~/.contentsplit/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum fragment length in codepoints
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Handling of words longer than `max_length`: "keep" or "split"
    #[serde(default)]
    pub long_words: LongWordPolicy,

    /// Where and whether fragments are written to disk
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_true")]
    pub write_files: bool,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("fragments")
}
fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            write_files: true,
        }
    }
}

impl SplitterConfig {
    /// Load configuration from the default path (~/.contentsplit/config.toml),
    /// then apply environment overrides:
    /// - `CONTENTSPLIT_MAX_LENGTH`
    /// - `CONTENTSPLIT_OUTPUT_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), max_length = config.max_length, "Loaded config");
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_LENGTH) {
            self.max_length = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{ENV_MAX_LENGTH} must be a positive integer, got {raw:?}"
                ))
            })?;
        }

        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output.directory = PathBuf::from(dir);
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".contentsplit")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "max_length must be greater than zero".into(),
            ));
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.directory must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Options for the core splitter.
    pub fn split_options(&self) -> SplitOptions {
        SplitOptions::new(self.max_length).with_long_words(self.long_words)
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Write the default config to `path` unless a file is already there.
    /// Returns whether a file was written.
    pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }

        let write_error = |e: std::io::Error| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, Self::default_toml()).map_err(write_error)?;

        tracing::info!("Wrote default config to {}", path.display());
        Ok(true)
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            long_words: LongWordPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
