//! Error types for Docent
//!
//! Every fallible path in the crate funnels into [`DocentError`], a
//! `thiserror` enum with one variant per failure domain.

use thiserror::Error;

/// Main error type for Docent operations
///
/// Covers config loading, credential storage, backend calls, and the
/// terminal session. Library and binary code alike return these through
/// the [`Result`] alias below.
#[derive(Error, Debug)]
pub enum DocentError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend gateway errors (API calls, decoding, unexpected replies)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Authentication errors (login failures, missing or rejected tokens)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Missing credentials for the backend
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Terminal session errors (raw mode, alternate screen, drawing)
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Filesystem and stream IO failures
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failures
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML config parse failures
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Transport-level HTTP failures
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// OS credential store failures
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Docent operations
///
/// Uses `anyhow::Error` on the error side so callers can attach context
/// with `.context(...)` and propagate with `?`.
pub type Result<T> = anyhow::Result<T>;
