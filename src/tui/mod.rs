//! Terminal chat screen for Docent
//!
//! This module owns the terminal lifecycle and the event loop; all state
//! and key handling live in [`app`], all drawing in [`view`]. The loop is
//! poll-driven: every tick it applies any send outcomes that arrived,
//! redraws, and waits up to the tick interval for the next input event.
//!
//! # Module Layout
//!
//! - `app`  -- Screen state, focus, and key dispatch
//! - `view` -- ratatui rendering

pub mod app;
pub mod view;

pub use app::ChatScreen;

use crate::config::Config;
use crate::error::{DocentError, Result};
use crate::gateway::Gateway;

use app::AppAction;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

/// How long one tick waits for input before redrawing
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the chat screen until the operator quits
///
/// Takes over the terminal (raw mode, alternate screen) and restores it on
/// every exit path, including panics, via a drop guard.
pub async fn run(config: &Config, gateway: Arc<dyn Gateway>) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(DocentError::Terminal(
            "chat mode requires a terminal; use the conversations subcommands for scripting"
                .to_string(),
        )
        .into());
    }

    enable_raw_mode().map_err(map_terminal_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(map_terminal_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(map_terminal_err)?;
    let mut cleanup = TerminalCleanup { enabled: true };

    let mut app = ChatScreen::new(gateway, config.ui.clone());
    app.bootstrap().await;

    loop {
        app.tick();

        terminal
            .draw(|frame| view::draw(frame, &mut app))
            .map_err(map_terminal_err)?;

        if !event::poll(TICK_INTERVAL).map_err(map_terminal_err)? {
            continue;
        }

        let next = event::read().map_err(map_terminal_err)?;
        let action = match next {
            Event::Key(key) => app.handle_key(key),
            _ => AppAction::None,
        };

        match action {
            AppAction::None => {}
            AppAction::Quit => break,
            AppAction::OpenConversation(id) => app.open_conversation(id).await,
            AppAction::DeleteConversation(id) => app.delete_conversation(id).await,
        }
    }

    terminal.show_cursor().map_err(map_terminal_err)?;
    drop(terminal);
    cleanup.disable();
    Ok(())
}

fn map_terminal_err(err: io::Error) -> DocentError {
    DocentError::Terminal(format!("terminal I/O error: {}", err))
}

/// Restores the terminal on drop, so a panic never leaves raw mode behind
struct TerminalCleanup {
    enabled: bool,
}

impl TerminalCleanup {
    fn disable(&mut self) {
        if !self.enabled {
            return;
        }

        self.enabled = false;
        let _ = disable_raw_mode();
        let mut out = io::stdout();
        let _ = execute!(out, LeaveAlternateScreen);
    }
}

impl Drop for TerminalCleanup {
    fn drop(&mut self) {
        self.disable();
    }
}
