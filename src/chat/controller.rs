//! Send controller state machine
//!
//! This module implements the pipeline that turns one submitted line of text
//! into exactly one backend call. The controller owns the transcript and the
//! conversation cache, appends an optimistic pending message at submit time,
//! and reconciles or rolls it back when the outcome arrives. Submissions made
//! while a send is outstanding are rejected, never queued, which is the
//! authoritative backstop behind the disabled send affordance.

use crate::chat::conversations::{Conversation, ConversationList};
use crate::chat::message::{Message, MessageId, MessageStatus};
use crate::chat::transcript::Transcript;
use crate::gateway::SendReply;
use tracing::{debug, warn};

/// Literal text surfaced to the operator when a send fails
pub const SEND_FAILURE_NOTICE: &str = "Failed to send message. Please try again.";

/// Controller state
///
/// Failure handling passes through a transient failed phase that collapses
/// back to `Idle` within the same resolution call, so only these two states
/// are ever observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// No send outstanding; submissions are accepted
    Idle,
    /// One send outstanding; submissions are rejected
    Sending,
}

/// Why a submission was not accepted
///
/// Neither rejection surfaces a notification; a submit during an
/// outstanding send is expected traffic from trailing key events, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Input was empty after trimming
    EmptyInput,
    /// A send is already outstanding
    AlreadySending,
}

/// Handle for one accepted submission
///
/// Captures everything the resolution handlers need: the optimistic
/// message's local id, the conversation the send was issued from, the
/// trimmed text that goes on the wire, and the operator's original input
/// for verbatim restore on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SendTicket {
    /// Local id of the optimistic pending message
    pub local_id: MessageId,
    /// Conversation captured at submit time; `None` for a draft
    pub conversation_id: Option<i64>,
    /// Trimmed text to send
    pub text: String,
    /// Untouched composer content, restored on failure
    pub original_input: String,
}

/// Outcome of a submit call
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The send was accepted; the caller must issue exactly one backend call
    Accepted(SendTicket),
    /// The send was rejected; nothing changed
    Rejected(SubmitRejection),
}

impl Submission {
    /// True when the submission was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// The send controller
///
/// Owns the transcript and the conversation cache; both are mutated only by
/// the transition handlers here, and since at most one send is outstanding
/// at a time no handler ever runs concurrently with another.
#[derive(Debug, Default)]
pub struct SendController {
    state: SendStateSlot,
    transcript: Transcript,
    conversations: ConversationList,
    active_conversation: Option<i64>,
}

/// Internal pairing of state and the outstanding ticket
///
/// `Sending` always carries the ticket it is waiting on, so the two cannot
/// drift apart.
#[derive(Debug, Default)]
enum SendStateSlot {
    #[default]
    Idle,
    Sending(SendTicket),
}

impl SendController {
    /// Creates an idle controller with no active conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> SendState {
        match self.state {
            SendStateSlot::Idle => SendState::Idle,
            SendStateSlot::Sending(_) => SendState::Sending,
        }
    }

    /// True while a send is outstanding
    ///
    /// Gates the send affordance and every navigation action: switching
    /// conversations, starting a draft, and deleting are all no-ops while
    /// this returns true.
    pub fn is_sending(&self) -> bool {
        matches!(self.state, SendStateSlot::Sending(_))
    }

    /// The transcript of the active conversation
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The conversation cache in display order
    pub fn conversations(&self) -> &ConversationList {
        &self.conversations
    }

    /// The active conversation id; `None` while composing a draft
    pub fn active_conversation(&self) -> Option<i64> {
        self.active_conversation
    }

    /// Submits one line of input
    ///
    /// An accepted submission appends a pending user message to the
    /// transcript, records the ticket, and moves to `Sending`; the caller
    /// must then issue exactly one backend call and feed the outcome back
    /// through [`resolve_success`](Self::resolve_success) or
    /// [`resolve_failure`](Self::resolve_failure). Empty input and submits
    /// during an outstanding send are rejected without any state change.
    pub fn submit(&mut self, input: &str) -> Submission {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Submission::Rejected(SubmitRejection::EmptyInput);
        }
        if self.is_sending() {
            debug!("submit rejected, send already outstanding");
            return Submission::Rejected(SubmitRejection::AlreadySending);
        }

        let message = Message::pending_user(trimmed, self.active_conversation);
        let ticket = SendTicket {
            local_id: message.id,
            conversation_id: self.active_conversation,
            text: trimmed.to_string(),
            original_input: input.to_string(),
        };
        debug!(id = %ticket.local_id, conversation = ?ticket.conversation_id, "send accepted");
        self.transcript.append(message);
        self.state = SendStateSlot::Sending(ticket.clone());
        Submission::Accepted(ticket)
    }

    /// Applies a successful send outcome
    ///
    /// Confirms the pending user message (adopting the server id when the
    /// reply carries the confirmed row), appends the assistant reply, and
    /// merges the returned conversation record into the cache. Transcript
    /// mutation is scoped to the conversation captured in the ticket; if the
    /// active conversation has changed since submit the transcript is left
    /// alone and only the cache merge applies.
    pub fn resolve_success(&mut self, local_id: MessageId, reply: SendReply) {
        let Some(ticket) = self.take_outstanding(local_id) else {
            return;
        };
        let conversation_id = reply.conversation.id;

        if ticket.conversation_id == self.active_conversation {
            match reply.user_message {
                Some(confirmed) => {
                    if !self.transcript.replace(&ticket.local_id, confirmed) {
                        warn!(id = %ticket.local_id, "pending message missing at confirmation");
                    }
                }
                None => {
                    // Reply omitted the confirmed user row; keep the local id
                    // until the next wholesale load replaces it.
                    match self.transcript.get_mut(&ticket.local_id) {
                        Some(pending) => pending.confirm_in_place(conversation_id),
                        None => {
                            warn!(id = %ticket.local_id, "pending message missing at confirmation")
                        }
                    }
                }
            }
            self.transcript.append(reply.message);
            // A send from a draft adopts the conversation the server created.
            self.active_conversation = Some(conversation_id);
        } else {
            debug!(
                ticket = ?ticket.conversation_id,
                active = ?self.active_conversation,
                "send confirmed for a conversation no longer displayed"
            );
        }

        self.conversations.upsert(reply.conversation);
    }

    /// Rolls back a failed send
    ///
    /// Removes the pending message so no ghost entry remains and returns the
    /// operator's original input for verbatim restoration into the composer.
    /// Returns `None` for a stale outcome that matches no outstanding ticket.
    pub fn resolve_failure(&mut self, local_id: MessageId) -> Option<String> {
        let ticket = self.take_outstanding(local_id)?;

        if ticket.conversation_id == self.active_conversation {
            match self.transcript.remove(&ticket.local_id) {
                Some(mut abandoned) => {
                    abandoned.status = MessageStatus::Failed;
                    debug!(id = %abandoned.id, "rolled back failed send");
                }
                None => warn!(id = %ticket.local_id, "pending message missing at rollback"),
            }
        }

        Some(ticket.original_input)
    }

    /// Replaces the conversation cache with a freshly listed roster
    pub fn install_roster(&mut self, conversations: Vec<Conversation>) {
        self.conversations.replace_all(conversations);
    }

    /// Switches to a conversation, installing its loaded history
    ///
    /// Rejected while a send is outstanding; a switch must not interleave
    /// with reconciliation. Returns true when the switch was applied.
    pub fn install_conversation(&mut self, id: i64, messages: Vec<Message>) -> bool {
        if self.is_sending() {
            debug!(conversation = id, "switch rejected while sending");
            return false;
        }
        self.active_conversation = Some(id);
        self.transcript.reset(messages);
        true
    }

    /// Starts an empty draft conversation
    ///
    /// Rejected while a send is outstanding. Returns true when applied.
    pub fn start_draft(&mut self) -> bool {
        if self.is_sending() {
            debug!("new conversation rejected while sending");
            return false;
        }
        self.active_conversation = None;
        self.transcript.clear();
        true
    }

    /// Records a confirmed deletion
    ///
    /// Drops the cache entry and, when the deleted conversation was the
    /// active one, falls back to an empty draft.
    pub fn apply_deletion(&mut self, id: i64) {
        self.conversations.remove(id);
        if self.active_conversation == Some(id) {
            self.active_conversation = None;
            self.transcript.clear();
        }
    }

    /// Takes the outstanding ticket when `local_id` answers it
    ///
    /// A non-matching id means a stale or duplicate outcome; it is logged
    /// and dropped without touching any state.
    fn take_outstanding(&mut self, local_id: MessageId) -> Option<SendTicket> {
        match &self.state {
            SendStateSlot::Sending(ticket) if ticket.local_id == local_id => {
                let SendStateSlot::Sending(ticket) = std::mem::take(&mut self.state) else {
                    unreachable!("matched Sending above");
                };
                Some(ticket)
            }
            SendStateSlot::Sending(_) => {
                warn!(id = %local_id, "dropping outcome for unknown send ticket");
                None
            }
            SendStateSlot::Idle => {
                warn!(id = %local_id, "dropping outcome, no send outstanding");
                None
            }
        }
    }
}
