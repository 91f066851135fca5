use async_trait::async_trait;
use log::warn;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::{ ChatClient, CompletionResponse };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Exponential backoff: base, 2*base, 4*base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0, Duration::from_millis(1000))
    }
}

/// Retries failed completions of the wrapped client with exponential backoff.
pub struct RetryingChatClient {
    inner: Arc<dyn ChatClient>,
    policy: RetryPolicy,
}

impl RetryingChatClient {
    pub fn new(inner: Arc<dyn ChatClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns `inner` unchanged when the policy allows no retries.
    pub fn wrap(inner: Arc<dyn ChatClient>, policy: RetryPolicy) -> Arc<dyn ChatClient> {
        if policy.max_retries == 0 {
            inner
        } else {
            Arc::new(Self::new(inner, policy))
        }
    }
}

#[async_trait]
impl ChatClient for RetryingChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(prompt).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) if attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Completion attempt {} of {} failed: {}. Retrying in {:?}",
                        attempt + 1,
                        self.policy.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e);
                }
            }
        }
    }

    fn get_model(&self) -> String {
        self.inner.get_model()
    }

    fn get_base_url(&self) -> Option<String> {
        self.inner.get_base_url()
    }
}
