//! Command-line interface definition for Docent
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chat, conversation management, and
//! authentication.

use clap::{Parser, Subcommand};

/// Docent - Terminal client for a document-grounded assistant
///
/// Chat with the assistant from the terminal, browse and manage
/// conversations, and keep answers anchored to their source documents.
#[derive(Parser, Debug, Clone)]
#[command(name = "docent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the backend base URL
    #[arg(long, env = "DOCENT_API_URL")]
    pub api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for Docent
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the interactive chat screen
    Chat,

    /// Inspect and manage conversations
    Conversations {
        /// Conversation management subcommand
        #[command(subcommand)]
        command: ConversationCommand,
    },

    /// Log in and store the access token
    Login {
        /// Account username
        username: String,
    },

    /// Discard the stored access token
    Logout,
}

/// Conversation management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConversationCommand {
    /// List conversations, most recently updated first
    List,

    /// Delete a conversation
    Delete {
        /// Conversation id to delete
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Command to run, with the bare invocation opening the chat screen
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            api_url: None,
            verbose: false,
            command: None,
        }
    }
}
