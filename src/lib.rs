pub mod client;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod notification;

// Re-export main types for convenience
pub use client::{CompletionClient, CompletionError, HttpClient, SimulatedClient};
pub use config::Config;
pub use controller::{ChatController, ChatState, CompletionOutcome, PendingRequest, RequestTicket};
pub use conversation::{ChatMessage, ChatRole, Conversation};
pub use notification::{Notification, Severity};
