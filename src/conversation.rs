//! In-memory conversation state
//!
//! The store knows nothing about the network. It holds the ordered turns of
//! one chat session and the flag that says whether a completion request is
//! outstanding. Who may call what, and when, is decided by the controller.

use serde::{Deserialize, Serialize};

/// One turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }
}

/// The author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// Ordered, append-only list of turns plus the pending flag.
///
/// `generation` is bumped on every reset so that a completion issued before
/// the reset can be recognised as stale when it lands.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    pending: bool,
    generation: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drop every turn. The pending flag is left alone.
    pub fn reset(&mut self) {
        self.messages = Vec::new();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut conv = Conversation::new();
        conv.append(ChatMessage::user("one"));
        conv.append(ChatMessage::assistant("two"));
        conv.append(ChatMessage::user("three"));

        let contents: Vec<&str> = conv.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(conv.last().map(|m| m.role), Some(ChatRole::User));
    }

    #[test]
    fn test_reset_empties_and_bumps_generation() {
        let mut conv = Conversation::new();
        for i in 0..5 {
            conv.append(ChatMessage::user(format!("msg {i}")));
        }
        let before = conv.generation();

        conv.reset();

        assert!(conv.is_empty());
        assert_eq!(conv.len(), 0);
        assert_eq!(conv.generation(), before + 1);

        // Resetting an empty conversation is fine too
        conv.reset();
        assert_eq!(conv.len(), 0);
    }

    #[test]
    fn test_reset_keeps_pending_flag() {
        let mut conv = Conversation::new();
        conv.set_pending(true);
        conv.reset();
        assert!(conv.is_pending());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::system("be brief");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "be brief"}));

        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"Hi"}"#).unwrap();
        assert_eq!(parsed, ChatMessage::assistant("Hi"));
    }
}
