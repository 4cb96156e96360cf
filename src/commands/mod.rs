/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`          - Interactive terminal chat
- `conversations` - List and delete conversations from scripts
- `login`         - Exchange credentials for a stored access token
- `logout`        - Remove the stored access token

The handlers are intentionally small and use the library components:
the gateway, the credential store, and the chat screen.
*/

use crate::auth::TokenStore;
use crate::config::Config;
use crate::error::{DocentError, Result};
use crate::gateway::{Gateway, HttpGateway};

/// Builds an authenticated gateway for the configured backend
///
/// Every chat endpoint requires a bearer token, so a missing credential is
/// reported here rather than as a 401 on the first request.
fn build_gateway(config: &Config) -> Result<HttpGateway> {
    let store = TokenStore;
    let token = store.resolve()?;
    if token.is_none() {
        return Err(DocentError::MissingCredentials(
            "no access token found; run `docent login <username>` or set DOCENT_TOKEN".to_string(),
        )
        .into());
    }
    Ok(HttpGateway::new(&config.api, token)?)
}

// Interactive chat handler
pub mod chat {
    //! Interactive chat screen.
    //!
    //! Builds the authenticated gateway and hands control to the terminal
    //! event loop until the operator quits.

    use super::*;
    use std::sync::Arc;

    /// Start the interactive chat screen
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    ///
    /// # Examples
    ///
    /// ```
    /// use docent::commands::chat;
    /// use docent::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default()).await?;
    /// ```
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let gateway = Arc::new(build_gateway(&config)?);
        crate::tui::run(&config, gateway).await
    }
}

// Conversation management handlers
pub mod conversations {
    //! Conversation management without a terminal UI.
    //!
    //! Mirrors the sidebar operations of the chat screen for scripted use:
    //! a table listing and a confirmed deletion.

    use super::*;
    use crate::chat::DELETE_CONFIRM_PROMPT;
    use crate::cli::ConversationCommand;
    use colored::Colorize;
    use prettytable::{format, Table};
    use std::io::{self, Write};

    /// Handle conversation subcommands
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `command` - The subcommand to run
    pub async fn handle(config: Config, command: ConversationCommand) -> Result<()> {
        match command {
            ConversationCommand::List => list(&config).await,
            ConversationCommand::Delete { id, yes } => delete(&config, id, yes).await,
        }
    }

    async fn list(config: &Config) -> Result<()> {
        let gateway = build_gateway(config)?;
        let conversations = gateway.list_conversations().await?;

        if conversations.is_empty() {
            println!("{}", "No conversations found.".yellow());
            return Ok(());
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

        table.add_row(prettytable::row![
            "ID".bold(),
            "Title".bold(),
            "Messages".bold(),
            "Last Updated".bold()
        ]);

        for conversation in conversations {
            let updated = conversation.updated_at.format("%Y-%m-%d %H:%M").to_string();
            table.add_row(prettytable::row![
                conversation.id.to_string().cyan(),
                truncate_title(&conversation.title, 40),
                conversation.message_count,
                updated
            ]);
        }

        table.printstd();
        Ok(())
    }

    async fn delete(config: &Config, id: i64, yes: bool) -> Result<()> {
        if !yes && !confirm_deletion()? {
            println!("Aborted.");
            return Ok(());
        }

        let gateway = build_gateway(config)?;
        gateway.delete_conversation(id).await?;
        println!("{}", format!("Deleted conversation {}", id).green());
        Ok(())
    }

    /// Asks for confirmation on stdin, defaulting to no
    fn confirm_deletion() -> Result<bool> {
        print!("{} [y/N] ", DELETE_CONFIRM_PROMPT);
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
    }

    /// Truncates a title for table display without splitting a character
    fn truncate_title(title: &str, max: usize) -> String {
        if title.chars().count() <= max {
            return title.to_string();
        }
        let cut: String = title.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }

}

// Login handler
pub mod login {
    //! Credential exchange and token storage.
    //!
    //! Prompts for the password without echo, trades the credentials for a
    //! bearer token, and files the token in the OS keyring.

    use super::*;
    use colored::Colorize;
    use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
    use crossterm::terminal;
    use std::io::{self, Write};

    /// Log in and store the access token
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `username` - Backend account name
    pub async fn run_login(config: Config, username: String) -> Result<()> {
        tracing::info!("Logging in as {}", username);

        let password = prompt_password(&format!("Password for {}: ", username))?;
        if password.is_empty() {
            return Err(DocentError::Authentication("empty password".to_string()).into());
        }

        let token = HttpGateway::login(&config.api, &username, &password).await?;
        let store = TokenStore;
        store.save(&token)?;

        println!("{}", "Logged in; token stored in the system keyring.".green());
        Ok(())
    }

    /// Reads a password from the terminal without echoing it
    fn prompt_password(prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        terminal::enable_raw_mode()?;
        let password = read_password_keys();
        terminal::disable_raw_mode()?;
        println!();

        password
    }

    fn read_password_keys() -> Result<String> {
        let mut password = String::new();
        loop {
            if let Event::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                match key.code {
                    KeyCode::Enter => break,
                    KeyCode::Backspace => {
                        password.pop();
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Err(
                            DocentError::Authentication("login cancelled".to_string()).into()
                        );
                    }
                    KeyCode::Char(ch) => password.push(ch),
                    _ => {}
                }
            }
        }
        Ok(password)
    }
}

// Logout handler
pub mod logout {
    //! Stored credential removal.

    use super::*;
    use colored::Colorize;

    /// Remove the stored access token
    ///
    /// Removing an absent token succeeds, so repeated logouts are harmless.
    pub fn run_logout() -> Result<()> {
        let store = TokenStore;
        store.delete()?;
        println!("{}", "Logged out; stored token removed.".green());
        Ok(())
    }
}
