//! Configuration management for Docent
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{DocentError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for Docent
///
/// This structure holds everything the client needs: where the backend
/// lives, how the chat screen is laid out, and where chat-mode logs go.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Chat screen settings
    #[serde(default)]
    pub ui: UiConfig,

    /// Log file for chat mode, where stderr is owned by the terminal UI
    ///
    /// When unset, chat mode logs under the platform data directory.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without a trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for backend requests (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Chat screen configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Width of the conversation sidebar (columns)
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u16,

    /// Render source references under assistant messages
    #[serde(default = "default_show_sources")]
    pub show_sources: bool,
}

fn default_sidebar_width() -> u16 {
    32
}

fn default_show_sources() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sidebar_width: default_sidebar_width(),
            show_sources: default_show_sources(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Default configuration file location, e.g. `~/.config/docent/config.yaml`
    pub fn default_path() -> String {
        directories::ProjectDirs::from("", "", "docent")
            .map(|dirs| dirs.config_dir().join("config.yaml").display().to_string())
            .unwrap_or_else(|| "config.yaml".to_string())
    }

    /// Log file used by chat mode when `log_file` is unset
    pub fn default_log_file() -> PathBuf {
        directories::ProjectDirs::from("", "", "docent")
            .map(|dirs| dirs.data_local_dir().join("docent.log"))
            .unwrap_or_else(|| PathBuf::from("docent.log"))
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DocentError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DocentError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(timeout) = std::env::var("DOCENT_API_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DOCENT_API_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(width) = std::env::var("DOCENT_SIDEBAR_WIDTH") {
            if let Ok(value) = width.parse() {
                self.ui.sidebar_width = value;
            } else {
                tracing::warn!("Invalid DOCENT_SIDEBAR_WIDTH: {}", width);
            }
        }

        if let Ok(show) = std::env::var("DOCENT_SHOW_SOURCES") {
            if let Ok(value) = show.parse() {
                self.ui.show_sources = value;
            } else {
                tracing::warn!("Invalid DOCENT_SHOW_SOURCES: {}", show);
            }
        }

        if let Ok(log_file) = std::env::var("DOCENT_LOG_FILE") {
            self.log_file = Some(PathBuf::from(log_file));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Returns
    ///
    /// Returns Ok if configuration is valid
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api.base_url).map_err(|e| {
            DocentError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(DocentError::Config(format!(
                "api.base_url must use http or https, got: {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(DocentError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.timeout_seconds > 600 {
            return Err(DocentError::Config(
                "api.timeout_seconds must be 600 or less".to_string(),
            )
            .into());
        }

        if self.ui.sidebar_width < 20 {
            return Err(DocentError::Config(
                "ui.sidebar_width must be at least 20 columns".to_string(),
            )
            .into());
        }

        if self.ui.sidebar_width > 120 {
            return Err(DocentError::Config(
                "ui.sidebar_width must be 120 columns or less".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
