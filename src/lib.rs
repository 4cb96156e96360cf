//! Docent - Terminal client for a document-grounded QA assistant library
//!
//! This library provides the core functionality for the docent chat client,
//! including the conversation model, the send pipeline, the backend gateway,
//! and the terminal user interface.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: Transcript, conversation cache, composer, and send pipeline
//! - `gateway`: Backend abstraction, its HTTP implementation, and a scripted
//!   in-memory double for tests
//! - `tui`: Terminal event loop, screen state, and rendering
//! - `auth`: Access token storage in the OS keyring
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers the CLI entrypoint dispatches to
//!
//! # Example
//!
//! ```no_run
//! use docent::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     // docent::commands::chat::run_chat(config).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod tui;

// Re-export commonly used types
pub use chat::{ChatSession, Conversation, Message, Transcript};
pub use config::Config;
pub use error::{DocentError, Result};
pub use gateway::{Gateway, HttpGateway};
