//! Mediates between the composer, the chatbot service, and the local
//! transcript store.
//!
//! `Conversation` is deliberately synchronous: the view performs the actual
//! network call between `begin_send` and `complete_send`, so the whole
//! submit algorithm is testable without a UI runtime.

use crate::api::{ApiError, HistoryTurn, classify};
use crate::storage;
use crate::types::{ChatMessage, Role};

/// Payload for one outbound send: the new message plus every prior turn.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundChat {
    pub message: String,
    pub history: Vec<HistoryTurn>,
}

#[derive(Clone, Debug, Default)]
pub struct Conversation {
    user_id: Option<String>,
    messages: Vec<ChatMessage>,
    in_flight: bool,
    banner: Option<String>,
}

impl Conversation {
    /// Fresh transcript for a user, restored from the persisted slot.
    pub fn hydrate(user_id: Option<String>) -> Self {
        let messages = storage::load_messages(user_id.as_deref());
        Self {
            user_id,
            messages,
            in_flight: false,
            banner: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// A send is pending; the composer's submit affordance is disabled.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Transient inline error from the most recent failed send.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Admission gate for one send. Whitespace-only input and submits while
    /// a send is pending are dropped, not queued. On admission the user
    /// message is appended and persisted, and the outbound payload carries
    /// the history of every prior turn.
    pub fn begin_send(&mut self, input: &str) -> Option<OutboundChat> {
        let trimmed = input.trim();
        if trimmed.is_empty() || self.in_flight {
            return None;
        }

        self.banner = None;
        let history = self.messages.iter().map(HistoryTurn::from).collect();
        self.messages.push(ChatMessage::now(Role::User, trimmed));
        self.in_flight = true;
        self.persist();

        Some(OutboundChat {
            message: trimmed.to_string(),
            history,
        })
    }

    /// Apply the send outcome: a genuine reply, or a classified failure as
    /// both a banner and a synthetic transcript entry. Either way the
    /// in-flight flag clears and the full transcript is persisted.
    pub fn complete_send(&mut self, outcome: Result<String, ApiError>) {
        match outcome {
            Ok(reply) => {
                self.messages.push(ChatMessage::now(Role::Assistant, reply));
            }
            Err(err) => {
                let notice = classify(&err);
                self.messages
                    .push(ChatMessage::now(Role::Assistant, notice.transcript_note()));
                self.banner = Some(notice.body);
            }
        }
        self.in_flight = false;
        self.persist();
    }

    /// Explicit user action: empty the transcript, drop the banner, and
    /// delete the persisted slot.
    pub fn clear_transcript(&mut self) {
        self.messages.clear();
        self.banner = None;
        storage::clear_messages(self.user_id.as_deref());
    }

    fn persist(&self) {
        storage::save_messages(self.user_id.as_deref(), &self.messages);
    }
}
