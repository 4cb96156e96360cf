//! Chat screen state and key dispatch
//!
//! [`ChatScreen`] wraps the headless [`ChatSession`] with everything the
//! terminal adds: pane focus, sidebar selection, transcript scrolling, the
//! two-step delete confirmation, and a status line fed by send notices.
//! Key handling returns an [`AppAction`] so the event loop can run the
//! async operations (opening and deleting conversations) between draws.

use crate::chat::{ChatSession, Notifier, DELETE_CONFIRM_PROMPT};
use crate::config::UiConfig;
use crate::gateway::Gateway;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::{Arc, Mutex};

/// Pane that receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FocusPane {
    Sidebar,
    Transcript,
    Composer,
}

impl FocusPane {
    fn next(self) -> Self {
        match self {
            Self::Sidebar => Self::Transcript,
            Self::Transcript => Self::Composer,
            Self::Composer => Self::Sidebar,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Sidebar => Self::Composer,
            Self::Transcript => Self::Sidebar,
            Self::Composer => Self::Transcript,
        }
    }
}

/// Work the event loop must do after a key, outside the draw path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    Quit,
    OpenConversation(i64),
    DeleteConversation(i64),
}

/// Routes send notices into the status line
struct StatusNotifier {
    slot: Arc<Mutex<Option<String>>>,
}

impl Notifier for StatusNotifier {
    fn notify(&self, text: &str) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(text.to_string());
        }
    }
}

/// Terminal chat screen state
pub struct ChatScreen {
    pub(super) session: ChatSession,
    pub(super) ui: UiConfig,
    pub(super) focus: FocusPane,
    pub(super) sidebar_selected: usize,
    /// Lines scrolled up from the bottom of the transcript
    pub(super) transcript_scroll: u16,
    pub(super) pending_delete: Option<i64>,
    pub(super) status: Option<String>,
    notices: Arc<Mutex<Option<String>>>,
}

impl ChatScreen {
    /// Creates a screen wired to a gateway
    pub fn new(gateway: Arc<dyn Gateway>, ui: UiConfig) -> Self {
        let notices = Arc::new(Mutex::new(None));
        let notifier = Arc::new(StatusNotifier {
            slot: Arc::clone(&notices),
        });
        Self {
            session: ChatSession::new(gateway, notifier),
            ui,
            focus: FocusPane::Composer,
            sidebar_selected: 0,
            transcript_scroll: 0,
            pending_delete: None,
            status: None,
            notices,
        }
    }

    /// Loads the roster and opens the most recent conversation
    ///
    /// Backend failures land in the status line; the screen still opens so
    /// the operator can see what went wrong.
    pub async fn bootstrap(&mut self) {
        if let Err(error) = self.session.load_conversations().await {
            self.status = Some(format!("Could not load conversations: {}", error));
            return;
        }

        let most_recent = self
            .session
            .conversations()
            .conversations()
            .first()
            .map(|c| c.id);
        if let Some(id) = most_recent {
            self.open_conversation(id).await;
        }
    }

    /// Applies pending send outcomes and drains notices
    ///
    /// Called once per event-loop tick. Returns true when an outcome was
    /// applied, which also snaps the transcript back to the bottom.
    pub fn tick(&mut self) -> bool {
        let applied = self.session.poll_outcomes();
        if applied {
            self.transcript_scroll = 0;
        }

        if let Ok(mut slot) = self.notices.lock() {
            if let Some(text) = slot.take() {
                self.status = Some(text);
            }
        }

        applied
    }

    /// Handles one key event
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return AppAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
            return AppAction::Quit;
        }

        // An armed delete confirmation consumes every key until resolved.
        if let Some(id) = self.pending_delete {
            return self.handle_delete_confirm_key(key, id);
        }

        if key.code == KeyCode::Esc {
            return AppAction::Quit;
        }

        if key.code == KeyCode::BackTab {
            self.focus = self.focus.prev();
            return AppAction::None;
        }

        if key.code == KeyCode::Tab {
            self.focus = self.focus.next();
            return AppAction::None;
        }

        if ctrl && matches!(key.code, KeyCode::Char('n') | KeyCode::Char('N')) {
            if self.session.start_new_conversation() {
                self.focus = FocusPane::Composer;
                self.transcript_scroll = 0;
                self.status = Some("New conversation".to_string());
            }
            return AppAction::None;
        }

        if ctrl && matches!(key.code, KeyCode::Char('k') | KeyCode::Char('K')) {
            return self.switch_relative(-1);
        }

        if ctrl && matches!(key.code, KeyCode::Char('j') | KeyCode::Char('J')) {
            return self.switch_relative(1);
        }

        if ctrl && matches!(key.code, KeyCode::Char('d') | KeyCode::Char('D')) {
            self.arm_delete();
            return AppAction::None;
        }

        match self.focus {
            FocusPane::Composer => {
                let was_sending = self.session.is_sending();
                self.session.handle_composer_key(&key);
                if !was_sending && self.session.is_sending() {
                    self.transcript_scroll = 0;
                }
                AppAction::None
            }
            FocusPane::Sidebar => self.handle_sidebar_key(key),
            FocusPane::Transcript => {
                self.handle_transcript_key(key);
                AppAction::None
            }
        }
    }

    fn handle_delete_confirm_key(&mut self, key: KeyEvent, id: i64) -> AppAction {
        self.pending_delete = None;
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.status = None;
                AppAction::DeleteConversation(id)
            }
            _ => {
                self.status = Some("Deletion cancelled".to_string());
                AppAction::None
            }
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) -> AppAction {
        let list = self.session.conversations();
        if list.is_empty() {
            return AppAction::None;
        }
        let last = list.len() - 1;

        match key.code {
            KeyCode::Up => {
                let next = self.sidebar_selected.min(last).saturating_sub(1);
                self.open_selected(next)
            }
            KeyCode::Down => {
                let next = (self.sidebar_selected + 1).min(last);
                self.open_selected(next)
            }
            KeyCode::Enter => self.open_selected(self.sidebar_selected.min(last)),
            _ => AppAction::None,
        }
    }

    fn handle_transcript_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.transcript_scroll = self.transcript_scroll.saturating_add(1),
            KeyCode::Down => self.transcript_scroll = self.transcript_scroll.saturating_sub(1),
            KeyCode::PageUp => self.transcript_scroll = self.transcript_scroll.saturating_add(10),
            KeyCode::PageDown => self.transcript_scroll = self.transcript_scroll.saturating_sub(10),
            KeyCode::End => self.transcript_scroll = 0,
            _ => {}
        }
    }

    /// Maps a sidebar index to an open action
    ///
    /// The highlight itself only moves once the open succeeds, in
    /// [`Self::open_conversation`]; a refused open leaves it on the
    /// conversation still shown in the transcript.
    fn open_selected(&self, index: usize) -> AppAction {
        match self.session.conversations().conversations().get(index) {
            Some(conversation) => AppAction::OpenConversation(conversation.id),
            None => AppAction::None,
        }
    }

    /// Moves to the conversation `delta` places from the active one
    ///
    /// While drafting, moving down opens the most recent conversation.
    fn switch_relative(&mut self, delta: isize) -> AppAction {
        let list = self.session.conversations().conversations();
        if list.is_empty() {
            return AppAction::None;
        }

        let target = match self.active_index() {
            Some(current) => {
                let last = list.len() as isize - 1;
                let next = (current as isize + delta).clamp(0, last);
                if next == current as isize {
                    return AppAction::None;
                }
                next as usize
            }
            None if delta > 0 => 0,
            None => return AppAction::None,
        };

        AppAction::OpenConversation(list[target].id)
    }

    fn active_index(&self) -> Option<usize> {
        let active = self.session.active_conversation()?;
        self.session
            .conversations()
            .conversations()
            .iter()
            .position(|c| c.id == active)
    }

    fn arm_delete(&mut self) {
        if self.session.is_sending() {
            return;
        }

        let target = match self.focus {
            FocusPane::Sidebar => self
                .session
                .conversations()
                .conversations()
                .get(self.sidebar_selected)
                .map(|c| c.id),
            _ => self.session.active_conversation(),
        };

        match target {
            Some(id) => {
                self.pending_delete = Some(id);
                self.status = Some(format!("{} (y/N)", DELETE_CONFIRM_PROMPT));
            }
            None => {
                self.status = Some("No conversation selected".to_string());
            }
        }
    }

    /// Opens a conversation, syncing the sidebar highlight on success
    pub async fn open_conversation(&mut self, id: i64) {
        match self.session.open_conversation(id).await {
            Ok(true) => {
                if let Some(index) = self.active_index() {
                    self.sidebar_selected = index;
                }
                self.transcript_scroll = 0;
            }
            Ok(false) => {}
            Err(error) => {
                self.status = Some(error.to_string());
            }
        }
    }

    /// Deletes a conversation after the operator confirmed
    pub async fn delete_conversation(&mut self, id: i64) {
        match self.session.delete_conversation(id).await {
            Ok(true) => {
                let last = self.session.conversations().len().saturating_sub(1);
                self.sidebar_selected = self.sidebar_selected.min(last);
                self.status = Some("Conversation deleted".to_string());
            }
            Ok(false) => {}
            Err(error) => {
                self.status = Some(error.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Conversation, SEND_FAILURE_NOTICE};
    use crate::gateway::fake::ScriptedGateway;
    use crate::gateway::GatewayError;
    use chrono::{TimeZone, Utc};
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(ch),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn conversation_record(id: i64, title: &str, updated_offset: i64) -> Conversation {
        let at = Utc.timestamp_opt(1_700_000_000 + updated_offset, 0).unwrap();
        Conversation {
            id,
            title: title.to_string(),
            created_at: at,
            updated_at: at,
            message_count: 2,
        }
    }

    /// Screen bootstrapped with conversations 2 (active, most recent) and 1
    async fn screen_with_two_conversations() -> (Arc<ScriptedGateway>, ChatScreen) {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway
            .stage_conversations(vec![
                conversation_record(1, "Older", 0),
                conversation_record(2, "Newer", 100),
            ])
            .await;
        let mut screen =
            ChatScreen::new(Arc::clone(&gateway) as Arc<dyn Gateway>, UiConfig::default());
        screen.bootstrap().await;
        (gateway, screen)
    }

    fn type_text(screen: &mut ChatScreen, text: &str) {
        for ch in text.chars() {
            screen.handle_key(key(KeyCode::Char(ch)));
        }
    }

    #[tokio::test]
    async fn test_bootstrap_opens_most_recent_conversation() {
        let (_gateway, screen) = screen_with_two_conversations().await;
        assert_eq!(screen.session.active_conversation(), Some(2));
        assert_eq!(screen.sidebar_selected, 0);
    }

    #[tokio::test]
    async fn test_tab_cycles_focus_both_ways() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;
        assert_eq!(screen.focus, FocusPane::Composer);

        screen.handle_key(key(KeyCode::Tab));
        assert_eq!(screen.focus, FocusPane::Sidebar);
        screen.handle_key(key(KeyCode::Tab));
        assert_eq!(screen.focus, FocusPane::Transcript);
        screen.handle_key(key(KeyCode::BackTab));
        assert_eq!(screen.focus, FocusPane::Sidebar);
    }

    #[tokio::test]
    async fn test_ctrl_c_and_esc_quit() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;
        assert_eq!(screen.handle_key(ctrl('c')), AppAction::Quit);
        assert_eq!(screen.handle_key(key(KeyCode::Esc)), AppAction::Quit);
    }

    #[tokio::test]
    async fn test_typed_characters_reach_composer() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;
        type_text(&mut screen, "hi");
        assert_eq!(screen.session.composer().text(), "hi");
    }

    #[tokio::test]
    async fn test_ctrl_d_arms_confirm_and_y_deletes() {
        let (gateway, mut screen) = screen_with_two_conversations().await;

        assert_eq!(screen.handle_key(ctrl('d')), AppAction::None);
        assert_eq!(screen.pending_delete, Some(2));
        let status = screen.status.clone().unwrap();
        assert!(status.contains("Are you sure you want to delete this conversation?"));

        let action = screen.handle_key(key(KeyCode::Char('y')));
        assert_eq!(action, AppAction::DeleteConversation(2));

        screen.delete_conversation(2).await;
        assert_eq!(gateway.deleted_ids().await, vec![2]);
        assert_eq!(screen.session.active_conversation(), None);
    }

    #[tokio::test]
    async fn test_delete_confirm_cancelled_by_any_other_key() {
        let (gateway, mut screen) = screen_with_two_conversations().await;

        screen.handle_key(ctrl('d'));
        let action = screen.handle_key(key(KeyCode::Char('n')));
        assert_eq!(action, AppAction::None);
        assert_eq!(screen.pending_delete, None);
        assert!(gateway.deleted_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_esc_cancels_armed_delete_instead_of_quitting() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;

        screen.handle_key(ctrl('d'));
        let action = screen.handle_key(key(KeyCode::Esc));
        assert_eq!(action, AppAction::None);
        assert_eq!(screen.pending_delete, None);
    }

    #[tokio::test]
    async fn test_ctrl_d_is_noop_while_sending() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;

        // Nothing staged: the send stays outstanding until outcomes are
        // polled, which this test never does.
        type_text(&mut screen, "hello");
        screen.handle_key(key(KeyCode::Enter));
        assert!(screen.session.is_sending());

        screen.handle_key(ctrl('d'));
        assert_eq!(screen.pending_delete, None);
    }

    #[tokio::test]
    async fn test_ctrl_j_and_k_switch_conversations() {
        let (gateway, mut screen) = screen_with_two_conversations().await;

        let action = screen.handle_key(ctrl('j'));
        assert_eq!(action, AppAction::OpenConversation(1));
        screen.open_conversation(1).await;
        assert_eq!(screen.session.active_conversation(), Some(1));
        assert_eq!(screen.sidebar_selected, 1);

        let action = screen.handle_key(ctrl('k'));
        assert_eq!(action, AppAction::OpenConversation(2));

        // Already at the newest conversation after opening it.
        screen.open_conversation(2).await;
        assert_eq!(screen.handle_key(ctrl('k')), AppAction::None);
        let _ = gateway;
    }

    #[tokio::test]
    async fn test_sidebar_arrows_switch_selection() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;
        screen.focus = FocusPane::Sidebar;

        let action = screen.handle_key(key(KeyCode::Down));
        assert_eq!(action, AppAction::OpenConversation(1));
        screen.open_conversation(1).await;
        assert_eq!(screen.sidebar_selected, 1);

        let action = screen.handle_key(key(KeyCode::Up));
        assert_eq!(action, AppAction::OpenConversation(2));
        screen.open_conversation(2).await;
        assert_eq!(screen.sidebar_selected, 0);
    }

    #[tokio::test]
    async fn test_sidebar_highlight_holds_when_open_is_refused_mid_send() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;

        // Nothing staged, so the send stays outstanding for the whole test.
        type_text(&mut screen, "hello");
        screen.handle_key(key(KeyCode::Enter));
        assert!(screen.session.is_sending());

        screen.focus = FocusPane::Sidebar;
        let action = screen.handle_key(key(KeyCode::Down));
        assert_eq!(action, AppAction::OpenConversation(1));

        // The session refuses the open mid-send; the highlight must keep
        // pointing at the conversation the transcript still shows.
        screen.open_conversation(1).await;
        assert_eq!(screen.session.active_conversation(), Some(2));
        assert_eq!(screen.sidebar_selected, 0);
    }

    #[tokio::test]
    async fn test_ctrl_n_starts_draft_and_is_gated_while_sending() {
        let (_gateway, mut screen) = screen_with_two_conversations().await;

        screen.handle_key(ctrl('n'));
        assert_eq!(screen.session.active_conversation(), None);
        assert!(screen.session.transcript().is_empty());

        type_text(&mut screen, "hello");
        screen.handle_key(key(KeyCode::Enter));
        assert!(screen.session.is_sending());

        // Draft request is ignored mid-send; the pending message stays.
        screen.handle_key(ctrl('n'));
        assert_eq!(screen.session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_notice_lands_in_status_line() {
        let (gateway, mut screen) = screen_with_two_conversations().await;
        gateway
            .stage_failure(GatewayError::Network("connection reset".to_string()))
            .await;

        type_text(&mut screen, "hello");
        screen.handle_key(key(KeyCode::Enter));
        screen.session.settle_next().await;
        screen.tick();

        assert_eq!(screen.status.as_deref(), Some(SEND_FAILURE_NOTICE));
        assert_eq!(screen.session.composer().text(), "hello");
    }
}
