//! Rendering for the chat screen
//!
//! Widget construction only; all state lives on [`ChatScreen`]. Text shaping
//! for the transcript (role prefixes, pending markers, source labels) is
//! split into [`transcript_lines`] so it can be tested without a terminal.

use super::app::{ChatScreen, FocusPane};
use crate::chat::{Message, Role};

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

const KEY_HINTS: &str = "Tab focus · Ctrl+N new · Ctrl+K/J switch · Ctrl+D delete · Esc quit";

pub(super) fn draw(frame: &mut Frame, app: &mut ChatScreen) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.ui.sidebar_width),
            Constraint::Min(30),
        ])
        .split(frame.area());

    render_sidebar(frame, app, columns[0]);

    let input_height = app.session.composer().line_count().min(6) as u16 + 2;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(columns[1]);

    render_transcript(frame, app, rows[0]);
    render_composer(frame, app, rows[1]);
    render_status(frame, app, rows[2]);
}

fn pane_block<'a>(title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
}

fn render_sidebar(frame: &mut Frame, app: &ChatScreen, area: Rect) {
    let block = pane_block("Conversations", app.focus == FocusPane::Sidebar);

    let conversations = app.session.conversations().conversations();
    if conversations.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No conversations yet",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let active = app.session.active_conversation();
    let items: Vec<ListItem> = conversations
        .iter()
        .map(|conversation| {
            let marker = if Some(conversation.id) == active {
                "* "
            } else {
                "  "
            };
            ListItem::new(format!("{}{}", marker, conversation.summary_label()))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.sidebar_selected.min(conversations.len() - 1)));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_transcript(frame: &mut Frame, app: &mut ChatScreen, area: Rect) {
    let title = match app.session.active_conversation() {
        Some(id) => match app.session.conversations().get(id) {
            Some(conversation) => conversation.title.clone(),
            None => format!("Conversation {}", id),
        },
        None => "New conversation".to_string(),
    };
    let block = pane_block(title, app.focus == FocusPane::Transcript);

    let lines = transcript_lines(app.session.transcript().messages(), app.ui.show_sources);

    // Follow the bottom unless the operator scrolled up. The line count
    // ignores wrapping, so very long lines may need an extra page up.
    let visible = area.height.saturating_sub(2);
    let max_scroll = scroll_ceiling(lines.len(), visible);
    app.transcript_scroll = app.transcript_scroll.min(max_scroll);
    let offset = max_scroll - app.transcript_scroll;

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn render_composer(frame: &mut Frame, app: &ChatScreen, area: Rect) {
    let sending = app.session.is_sending();
    let title = if sending {
        Span::styled("Sending...", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("Message (Enter to send, Shift+Enter for newline)")
    };
    let block = pane_block(title, app.focus == FocusPane::Composer);

    let composer = app.session.composer();
    let paragraph = Paragraph::new(composer.text().to_string())
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);

    // Typing stays available during a send; only submission is held back.
    if app.focus == FocusPane::Composer {
        let (line, col) = composer.cursor_line_col();
        let x = area.x + 1 + col as u16;
        let y = area.y + 1 + line as u16;
        if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

fn render_status(frame: &mut Frame, app: &ChatScreen, area: Rect) {
    let mut spans = Vec::new();
    if app.session.is_sending() {
        spans.push(Span::styled(
            "[sending] ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    match &app.status {
        Some(status) => spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => spans.push(Span::styled(
            KEY_HINTS,
            Style::default().fg(Color::DarkGray),
        )),
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Highest scroll-up offset for a transcript of `total_lines` in a pane
/// showing `visible` rows, saturating at the widget limit instead of
/// wrapping on very large transcripts
fn scroll_ceiling(total_lines: usize, visible: u16) -> u16 {
    u16::try_from(total_lines)
        .unwrap_or(u16::MAX)
        .saturating_sub(visible)
}

/// Shapes transcript messages into styled lines
///
/// One block per message: a role-prefixed first line, continuation lines for
/// embedded newlines, source labels under assistant replies, and a blank
/// spacer line between messages.
pub(super) fn transcript_lines(messages: &[Message], show_sources: bool) -> Vec<Line<'static>> {
    if messages.is_empty() {
        return vec![Line::from(Span::styled(
            "No messages yet. Ask about the indexed documents.",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut lines = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }

        let (prefix, prefix_style) = match message.role {
            Role::User => (
                "You: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Role::Assistant => (
                "Docent: ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        };
        let body_style = if message.is_pending() {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default()
        };

        let mut content = message.content.split('\n');
        let first = content.next().unwrap_or("");
        let mut head = vec![
            Span::styled(prefix, prefix_style),
            Span::styled(first.to_string(), body_style),
        ];
        if message.is_pending() {
            head.push(Span::styled(
                " (sending)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(head));

        for continuation in content {
            lines.push(Line::from(Span::styled(continuation.to_string(), body_style)));
        }

        if show_sources {
            for source in &message.sources {
                lines.push(Line::from(Span::styled(
                    format!("  > {}", source.label()),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }
    lines
}
