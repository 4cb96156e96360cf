//! Docent - Terminal client for a document-grounded QA assistant
//!
#![doc = "Docent - Terminal client for a document-grounded QA assistant"]
#![doc = "Main entry point for the docent application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docent::cli::{Cli, Commands};
use docent::commands;
use docent::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let command = cli.command();
    init_tracing(&config, &command, cli.verbose)?;

    // Execute command
    match command {
        Commands::Chat => {
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Conversations { command } => {
            tracing::info!("Starting conversations command");
            commands::conversations::handle(config, command).await?;
            Ok(())
        }
        Commands::Login { username } => {
            commands::login::run_login(config, username).await?;
            Ok(())
        }
        Commands::Logout => {
            tracing::info!("Removing stored credentials");
            commands::logout::run_logout()?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// The chat screen owns the terminal, so its logs go to a file; every other
/// command logs to stderr to keep stdout clean for scripted output.
fn init_tracing(config: &Config, command: &Commands, verbose: bool) -> Result<()> {
    let default_directive = if verbose { "docent=debug" } else { "docent=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    if matches!(command, Commands::Chat) {
        let path = config
            .log_file
            .clone()
            .unwrap_or_else(Config::default_log_file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Arc::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
