//! The completion client: whatever turns a conversation into the next
//! assistant reply.

mod error;
mod http;
mod simulated;
#[cfg(test)]
pub(crate) mod testing;

pub use error::{CompletionError, GENERIC_FAILURE};
pub use http::HttpClient;
pub use simulated::SimulatedClient;

use async_trait::async_trait;

use crate::conversation::ChatMessage;

/// One request, one reply. Implementations make a single attempt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the full ordered history and return the assistant's content.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;
}
