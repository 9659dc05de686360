use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::OpenAIError;
use crate::models::transcript::Transcript;
use crate::service::openai_service::OpenAIClient;
use crate::service::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Summarize,
    AddEvent,
    Plan,
    Chat,
}

/// Maps a classifier reply onto an intent by substring containment, checking
/// "1", "2" and "3" in that order. A reply such as "plan type 3, not 1"
/// therefore routes to `Summarize`.
pub fn classify_reply(reply: &str) -> Intent {
    if reply.contains('1') {
        Intent::Summarize
    } else if reply.contains('2') {
        Intent::AddEvent
    } else if reply.contains('3') {
        Intent::Plan
    } else {
        Intent::Chat
    }
}

#[async_trait]
pub trait IntentRouter: Send + Sync {
    async fn route(&self, transcript: &Transcript, text: &str) -> Result<Intent, OpenAIError>;
}

pub struct OpenAIRouter {
    openai: Arc<dyn OpenAIClient>,
}

impl OpenAIRouter {
    pub fn new(openai: Arc<dyn OpenAIClient>) -> Self {
        Self { openai }
    }
}

#[async_trait]
impl IntentRouter for OpenAIRouter {
    async fn route(&self, transcript: &Transcript, text: &str) -> Result<Intent, OpenAIError> {
        let prompt = prompts::intent_prompt(text);
        debug!(%prompt, "intent classification prompt");
        let reply = self.openai.complete(&transcript.with_scratch(prompt)).await?;
        let intent = classify_reply(&reply);
        info!(?intent, reply = %reply.trim(), "classified request");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_label_in_fixed_order_wins() {
        assert_eq!(classify_reply("1) Summarize"), Intent::Summarize);
        assert_eq!(classify_reply("This is plan type 3, not 1"), Intent::Summarize);
        assert_eq!(classify_reply("(2)"), Intent::AddEvent);
        assert_eq!(classify_reply("3 and 2"), Intent::AddEvent);
        assert_eq!(classify_reply("3"), Intent::Plan);
    }

    #[test]
    fn no_label_falls_back_to_chat() {
        assert_eq!(classify_reply(""), Intent::Chat);
        assert_eq!(classify_reply("I'm not sure what you mean."), Intent::Chat);
    }
}
