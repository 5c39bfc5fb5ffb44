use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionClient, CompletionError};
use crate::conversation::ChatMessage;

const SIMULATED_REPLY: &str = "This is a simulated response. Run the chat backend and start \
without --simulate to get real answers.";

/// Offline stand-in for the backend: waits, then answers with fixed text.
#[derive(Debug, Clone)]
pub struct SimulatedClient {
    delay: Duration,
    reply: String,
}

impl SimulatedClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            reply: SIMULATED_REPLY.to_string(),
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }
}

impl Default for SimulatedClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl CompletionClient for SimulatedClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        debug!(
            messages = messages.len(),
            delay_ms = self.delay.as_millis() as u64,
            "simulating reply"
        );
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_after_delay() {
        let client = SimulatedClient::new(Duration::from_millis(20)).with_reply("pong");
        let started = tokio::time::Instant::now();

        let reply = client.complete(&[ChatMessage::user("ping")]).await.unwrap();

        assert_eq!(reply, "pong");
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
