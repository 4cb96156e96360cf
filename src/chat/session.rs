//! Chat session: the headless engine behind the terminal UI
//!
//! A [`ChatSession`] owns the send controller, the input composer, and the
//! gateway handle, and bridges the synchronous controller to the async
//! backend. Each accepted submission spawns one task whose outcome comes
//! back over an in-process channel; the host drains outcomes on its tick.
//! Because acceptance is single-flight, at most one such task is alive.
//!
//! The session is fully drivable without a terminal, which is how the
//! integration tests exercise the send pipeline end to end.

use crate::chat::composer::{Composer, ComposerEvent};
use crate::chat::controller::{SendController, SendTicket, Submission, SEND_FAILURE_NOTICE};
use crate::chat::conversations::ConversationList;
use crate::chat::message::MessageId;
use crate::chat::transcript::Transcript;
use crate::gateway::{Gateway, GatewayError, SendReply};

use crossterm::event::KeyEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Sink for operator-facing notices
///
/// The terminal UI shows notices in its status line; plain commands print
/// them to stderr. Tests record them to assert on exact text and count.
pub trait Notifier: Send + Sync {
    /// Surfaces one notice to the operator
    fn notify(&self, text: &str);
}

/// Outcome of one dispatched send, delivered over the session channel
struct SendOutcome {
    local_id: MessageId,
    result: Result<SendReply, GatewayError>,
}

/// Headless chat session
pub struct ChatSession {
    controller: SendController,
    composer: Composer,
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    outcome_tx: mpsc::UnboundedSender<SendOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<SendOutcome>,
}

impl ChatSession {
    /// Creates a session wired to a gateway and a notifier
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            controller: SendController::new(),
            composer: Composer::new(),
            gateway,
            notifier,
            outcome_tx,
            outcome_rx,
        }
    }

    /// The input composer, for rendering
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// The transcript of the active conversation
    pub fn transcript(&self) -> &Transcript {
        self.controller.transcript()
    }

    /// The conversation cache in display order
    pub fn conversations(&self) -> &ConversationList {
        self.controller.conversations()
    }

    /// The active conversation id; `None` while composing a draft
    pub fn active_conversation(&self) -> Option<i64> {
        self.controller.active_conversation()
    }

    /// True while a send is outstanding
    pub fn is_sending(&self) -> bool {
        self.controller.is_sending()
    }

    /// Feeds one composer key event
    ///
    /// Enter without Shift submits the composer contents; everything else
    /// edits the buffer. The composer is cleared only when the controller
    /// accepted the submission.
    pub fn handle_composer_key(&mut self, key: &KeyEvent) {
        if self.composer.handle_key(key) == ComposerEvent::SubmitRequested {
            self.submit_current();
        }
    }

    /// Submits the current composer contents
    ///
    /// On acceptance the composer is cleared and exactly one backend call is
    /// dispatched. Rejections leave the composer untouched.
    pub fn submit_current(&mut self) -> Submission {
        let text = self.composer.text().to_string();
        let submission = self.controller.submit(&text);
        if let Submission::Accepted(ticket) = &submission {
            self.composer.take();
            self.dispatch(ticket.clone());
        }
        submission
    }

    /// Loads the conversation roster from the backend
    ///
    /// Replaces the cache wholesale; called once on startup and again after
    /// operations that may have changed the roster server-side.
    pub async fn load_conversations(&mut self) -> Result<(), GatewayError> {
        let roster = self.gateway.list_conversations().await?;
        self.controller.install_roster(roster);
        Ok(())
    }

    /// Switches to a conversation, fetching its history
    ///
    /// Returns `Ok(false)` without any backend call while a send is
    /// outstanding; a switch must not interleave with reconciliation.
    pub async fn open_conversation(&mut self, id: i64) -> Result<bool, GatewayError> {
        if self.controller.is_sending() {
            return Ok(false);
        }
        let messages = self.gateway.fetch_messages(id).await?;
        Ok(self.controller.install_conversation(id, messages))
    }

    /// Starts an empty draft conversation
    ///
    /// Returns false while a send is outstanding.
    pub fn start_new_conversation(&mut self) -> bool {
        self.controller.start_draft()
    }

    /// Deletes a conversation
    ///
    /// The caller is responsible for confirming with the operator first.
    /// Returns `Ok(false)` without any backend call while a send is
    /// outstanding.
    pub async fn delete_conversation(&mut self, id: i64) -> Result<bool, GatewayError> {
        if self.controller.is_sending() {
            return Ok(false);
        }
        self.gateway.delete_conversation(id).await?;
        self.controller.apply_deletion(id);
        Ok(true)
    }

    /// Applies any send outcomes that have arrived
    ///
    /// Non-blocking; called on every UI tick. Returns true when at least one
    /// outcome was applied and a redraw is worthwhile.
    pub fn poll_outcomes(&mut self) -> bool {
        let mut applied = false;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
            applied = true;
        }
        applied
    }

    /// Waits for the next outcome and applies it
    ///
    /// Intended for headless driving in tests and one-shot flows; the
    /// terminal UI polls instead. Blocks until an outcome arrives, so only
    /// call it with a send outstanding.
    pub async fn settle_next(&mut self) {
        if let Some(outcome) = self.outcome_rx.recv().await {
            self.apply_outcome(outcome);
        }
    }

    fn dispatch(&self, ticket: SendTicket) {
        let gateway = Arc::clone(&self.gateway);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = gateway
                .send_message(ticket.conversation_id, &ticket.text)
                .await;
            // A closed channel means the session is gone; drop the outcome.
            let _ = outcome_tx.send(SendOutcome {
                local_id: ticket.local_id,
                result,
            });
        });
    }

    fn apply_outcome(&mut self, outcome: SendOutcome) {
        match outcome.result {
            Ok(reply) => self.controller.resolve_success(outcome.local_id, reply),
            Err(error) => {
                warn!("Send failed: {}", error);
                if let Some(original) = self.controller.resolve_failure(outcome.local_id) {
                    self.composer.restore(&original);
                    self.notifier.notify(SEND_FAILURE_NOTICE);
                }
            }
        }
    }
}
