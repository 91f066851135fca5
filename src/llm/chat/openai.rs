use async_trait::async_trait;
use log::info;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmConfig;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
pub(crate) struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

/// Builds a reqwest client that sends the bearer key on every request.
pub(crate) fn bearer_http_client(api_key: &str) -> Result<HttpClient, Box<dyn StdError + Send + Sync>> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| format!("Invalid API key format: {}", e))?
    );

    HttpClient::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)
}

/// Sends a single-user-message request to an OpenAI-compatible
/// `chat/completions` endpoint and returns the first choice.
pub(crate) async fn chat_completion(
    http: &HttpClient,
    url: &str,
    model: &str,
    prompt: &str,
    temperature: f32,
    max_tokens: Option<u32>
) -> Result<String, Box<dyn StdError + Send + Sync>> {
    let req = OpenAIChatRequest {
        model: model.to_string(),
        messages: vec![OpenAIMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        temperature,
        max_tokens,
    };

    let resp = http.post(url)
        .json(&req)
        .send()
        .await?
        .error_for_status()?
        .json::<OpenAIResponse>()
        .await?;

    let content = resp.choices
        .into_iter()
        .next()
        .ok_or_else(|| format!("No choices returned from {}", url))?
        .message.content;

    Ok(content)
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
        let http = bearer_http_client(&api_key)?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "OpenAI API key is required".to_string())?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        info!("OpenAIChatClient::complete() → model={} url={}", self.model, url);

        let content = chat_completion(&self.http, &url, &self.model, prompt, 1.0, Some(2048)).await?;
        Ok(CompletionResponse { response: content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
