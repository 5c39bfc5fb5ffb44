use thiserror::Error;

/// Text shown to the user when the backend gives us nothing better.
pub const GENERIC_FAILURE: &str = "Failed to send message. Please try again.";

/// Everything that can go wrong between issuing a completion request and
/// holding the assistant's reply.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Connection refused, timeout, body read failure
    #[error("request failed: {0}")]
    Network(String),

    /// Non-2xx status. `detail` is the server's `{"detail": ...}` text, if any.
    #[error("backend returned HTTP {status}")]
    Status { status: u16, detail: Option<String> },

    /// 2xx but the body was not the shape we expect
    #[error("malformed response: {0}")]
    Malformed(String),

    /// 2xx carrying a structured error payload instead of a message
    #[error("backend reported an error: {0}")]
    Application(String),
}

impl CompletionError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Server-provided explanation, if the backend sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            Self::Application(detail) => Some(detail.as_str()),
            Self::Network(_) | Self::Malformed(_) => None,
        }
    }

    /// Best-available message for the error notification.
    pub fn user_message(&self) -> String {
        self.detail()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string()
    }
}
