//! Input composer and key binding contract
//!
//! This module holds the multi-line input buffer under the transcript pane
//! and maps key events onto it. Enter without Shift asks the caller to
//! submit; Shift+Enter inserts a literal newline. The composer never clears
//! itself on Enter: the caller clears it only when the controller accepted
//! the submission, and restores the original text on a failed send.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key event did to the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerEvent {
    /// The buffer or cursor changed
    Edited,
    /// Enter without Shift; the caller should submit the current text
    SubmitRequested,
    /// The key is not composer input
    Ignored,
}

/// Multi-line input buffer with a byte-indexed cursor
///
/// The cursor always sits on a character boundary.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    buffer: String,
    cursor_byte: usize,
}

impl Composer {
    /// Creates an empty composer
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer contents
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// True when the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of logical lines, at least one
    pub fn line_count(&self) -> usize {
        self.buffer.split('\n').count()
    }

    /// Cursor position as (line, column) in characters
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.buffer[..self.cursor_byte];
        let line = before.matches('\n').count();
        let col = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count(),
            None => before.chars().count(),
        };
        (line, col)
    }

    /// Feeds one key event to the composer
    ///
    /// Application shortcuts carry the CONTROL modifier and are dispatched
    /// before the composer sees them; anything that still carries CONTROL
    /// here is ignored.
    pub fn handle_key(&mut self, key: &KeyEvent) -> ComposerEvent {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return ComposerEvent::Ignored;
        }
        if key.code == KeyCode::Enter && key.modifiers.contains(KeyModifiers::SHIFT) {
            self.newline();
            return ComposerEvent::Edited;
        }

        match key.code {
            KeyCode::Enter => ComposerEvent::SubmitRequested,
            KeyCode::Char(ch) => {
                self.insert_char(ch);
                ComposerEvent::Edited
            }
            KeyCode::Backspace => {
                self.backspace();
                ComposerEvent::Edited
            }
            KeyCode::Left => {
                self.cursor_left();
                ComposerEvent::Edited
            }
            KeyCode::Right => {
                self.cursor_right();
                ComposerEvent::Edited
            }
            KeyCode::Up => {
                self.cursor_up();
                ComposerEvent::Edited
            }
            KeyCode::Down => {
                self.cursor_down();
                ComposerEvent::Edited
            }
            KeyCode::Home => {
                self.cursor_home();
                ComposerEvent::Edited
            }
            KeyCode::End => {
                self.cursor_end();
                ComposerEvent::Edited
            }
            _ => ComposerEvent::Ignored,
        }
    }

    /// Takes the buffer, leaving the composer empty
    ///
    /// Called after the controller accepted a submission.
    pub fn take(&mut self) -> String {
        self.cursor_byte = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Puts text back, cursor at the end
    ///
    /// Called on a failed send so the operator can retry without retyping.
    pub fn restore(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor_byte = self.buffer.len();
    }

    /// Inserts one character at the cursor
    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor_byte, ch);
        self.cursor_byte += ch.len_utf8();
    }

    /// Inserts a literal newline at the cursor
    pub fn newline(&mut self) {
        self.insert_char('\n');
    }

    /// Removes the character before the cursor
    pub fn backspace(&mut self) {
        if self.cursor_byte == 0 {
            return;
        }
        let previous = self.previous_boundary();
        self.buffer.drain(previous..self.cursor_byte);
        self.cursor_byte = previous;
    }

    fn cursor_left(&mut self) {
        if self.cursor_byte > 0 {
            self.cursor_byte = self.previous_boundary();
        }
    }

    fn cursor_right(&mut self) {
        if let Some(next) = self.buffer[self.cursor_byte..].chars().next() {
            self.cursor_byte += next.len_utf8();
        }
    }

    fn cursor_up(&mut self) {
        let (line, col) = self.cursor_line_col();
        if line > 0 {
            self.set_cursor_line_col(line - 1, col);
        }
    }

    fn cursor_down(&mut self) {
        let (line, col) = self.cursor_line_col();
        if line + 1 < self.line_count() {
            self.set_cursor_line_col(line + 1, col);
        }
    }

    fn cursor_home(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.set_cursor_line_col(line, 0);
    }

    fn cursor_end(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.set_cursor_line_col(line, usize::MAX);
    }

    fn previous_boundary(&self) -> usize {
        self.buffer[..self.cursor_byte]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    fn set_cursor_line_col(&mut self, line: usize, col: usize) {
        let target = match self.buffer.split('\n').nth(line) {
            Some(text) => text,
            None => return,
        };
        let line_start = self
            .buffer
            .split('\n')
            .take(line)
            .map(|l| l.len() + 1)
            .sum::<usize>();
        let clamped: usize = target
            .chars()
            .take(col)
            .map(|ch| ch.len_utf8())
            .sum();
        self.cursor_byte = line_start + clamped;
    }
}
