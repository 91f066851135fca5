//! Scripted chat client for tests.
//!
//! Replies are consumed in order; once the script runs out every call gets
//! the fallback reply. Every prompt is recorded for later assertions.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::sync::Mutex;

use super::{ ChatClient, CompletionResponse };

#[derive(Debug, Clone)]
enum ScriptedReply {
    Text(String),
    Failure(String),
}

#[derive(Debug, Default)]
pub struct MockChatClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful completion.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(ScriptedReply::Text(text.into()));
        self
    }

    /// Queues a failed completion carrying `message`.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(ScriptedReply::Failure(message.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn push(&self, reply: ScriptedReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self.replies.lock().ok().and_then(|mut replies| replies.pop_front());
        match next {
            Some(ScriptedReply::Text(text)) => Ok(CompletionResponse { response: text }),
            Some(ScriptedReply::Failure(message)) => Err(message.into()),
            None => Ok(CompletionResponse { response: "Mock response".to_string() }),
        }
    }

    fn get_model(&self) -> String {
        "mock-model".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}
