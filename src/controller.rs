//! Chat controller: draft input, submission, completion handling.
//!
//! The controller is the only thing allowed to mutate the [`Conversation`].
//! It runs on one logical thread. Submitting hands back a [`PendingRequest`]
//! that the caller sends to a [`CompletionClient`] however it likes (inline
//! via [`ChatController::send`], or on a spawned task); the result comes back
//! through [`ChatController::complete`] together with the request's ticket.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::client::{CompletionClient, CompletionError};
use crate::conversation::{ChatMessage, Conversation};
use crate::notification::Notification;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingResponse,
}

/// Identifies one outstanding request and the conversation generation it
/// was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    id: u64,
    generation: u64,
}

/// A submission that still has to be sent to the completion client.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    /// Full history at submission time, the new user turn included
    pub messages: Vec<ChatMessage>,
}

/// What [`ChatController::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Assistant turn appended
    Appended,
    /// Error notification emitted, nothing appended
    Failed,
    /// The chat was cleared after the request went out; result dropped
    Discarded,
    /// Ticket does not match the outstanding request
    Ignored,
}

#[derive(Debug, Default)]
pub struct ChatController {
    conversation: Conversation,
    draft: String,
    cursor: usize, // cursor position in draft, in chars
    notifications: VecDeque<Notification>,
    in_flight: Option<u64>,
    next_request_id: u64,
}

impl ChatController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn is_pending(&self) -> bool {
        self.conversation.is_pending()
    }

    pub fn state(&self) -> ChatState {
        if self.conversation.is_pending() {
            ChatState::AwaitingResponse
        } else {
            ChatState::Idle
        }
    }

    /// Whether `submit` would currently do anything
    pub fn can_submit(&self) -> bool {
        !self.is_pending() && !self.draft.trim().is_empty()
    }

    /// Promote the draft into a user turn and go pending.
    ///
    /// Returns `None` without touching any state when the draft is blank or
    /// a request is already outstanding.
    pub fn submit(&mut self) -> Option<PendingRequest> {
        if self.is_pending() {
            debug!("submission ignored: request already outstanding");
            return None;
        }
        let content = self.draft.trim();
        if content.is_empty() {
            return None;
        }

        let message = ChatMessage::user(content);
        self.conversation.append(message);
        self.draft.clear();
        self.cursor = 0;
        self.conversation.set_pending(true);

        let id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(id);

        let ticket = RequestTicket {
            id,
            generation: self.conversation.generation(),
        };
        info!(
            request_id = id,
            messages = self.conversation.len(),
            "chat request issued"
        );

        Some(PendingRequest {
            ticket,
            messages: self.conversation.messages().to_vec(),
        })
    }

    /// Apply the result of the request identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<String, CompletionError>,
    ) -> CompletionOutcome {
        if self.in_flight != Some(ticket.id) {
            warn!(request_id = ticket.id, "completion for unknown request ignored");
            return CompletionOutcome::Ignored;
        }
        self.in_flight = None;
        self.conversation.set_pending(false);

        if ticket.generation != self.conversation.generation() {
            debug!(request_id = ticket.id, "chat was cleared; dropping completion");
            return CompletionOutcome::Discarded;
        }

        match result {
            Ok(content) => {
                info!(request_id = ticket.id, chars = content.len(), "assistant reply received");
                self.conversation.append(ChatMessage::assistant(content));
                CompletionOutcome::Appended
            }
            Err(e) => {
                warn!(request_id = ticket.id, error = %e, "chat request failed");
                self.notifications
                    .push_back(Notification::error("Error", e.user_message()));
                CompletionOutcome::Failed
            }
        }
    }

    /// Submit the draft and wait for the reply on the current task.
    ///
    /// Returns `None` if the submission was rejected.
    pub async fn send<C>(&mut self, client: &C) -> Option<CompletionOutcome>
    where
        C: CompletionClient + ?Sized,
    {
        let request = self.submit()?;
        let result = client.complete(&request.messages).await;
        Some(self.complete(request.ticket, result))
    }

    /// Empty the conversation. Pending is left as it is; an outstanding
    /// request still completes, but its result is dropped.
    pub fn clear_chat(&mut self) {
        info!(
            cleared = self.conversation.len(),
            pending = self.is_pending(),
            "chat cleared"
        );
        self.conversation.reset();
        self.notifications.push_back(Notification::info(
            "Chat cleared",
            "All messages have been removed.",
        ));
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Hand queued notifications to the presentation layer.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    // Draft editing

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.cursor = self.draft.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let char_count = self.draft.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }
}
