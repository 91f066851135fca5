use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use std::error::Error as StdError;

use super::openai::{ bearer_http_client, chat_completion };
use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmConfig;

const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai";

pub struct GroqChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_GROQ_URL.to_string());

        Ok(Self {
            http: bearer_http_client(&api_key)?,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "Groq API key is required".to_string())?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        // Groq speaks the OpenAI wire format under its own prefix.
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        info!("GroqChatClient::complete() → model={} url={}", self.model, url);

        let content = chat_completion(&self.http, &url, &self.model, prompt, 0.7, Some(1024)).await?;
        Ok(CompletionResponse { response: content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
