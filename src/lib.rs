pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod course;
pub mod llm;
pub mod models;
pub mod server;

use auth::TokenVerifier;
use cli::Args;
use config::prompt::{ builtin_prompts, load_prompts };
use course::CourseAssistant;
use governor::{ Quota, RateLimiter };
use llm::chat::new_client;
use llm::chat::retry::{ RetryPolicy, RetryingChatClient };
use llm::{ LlmConfig, LlmType };
use log::info;
use server::{ AppState, Server };
use std::error::Error;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Builds the shared handler state (model client, templates, token check,
/// limiter) from the parsed configuration.
pub fn build_state(args: &Args) -> Result<AppState, Box<dyn Error + Send + Sync>> {
    let llm_config = LlmConfig {
        llm_type: args.chat_llm_type.parse::<LlmType>()?,
        api_key: non_empty(&args.chat_api_key),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
    };
    let policy = RetryPolicy::new(args.llm_max_retries, Duration::from_millis(args.llm_retry_base_ms));
    let chat_client = RetryingChatClient::wrap(new_client(&llm_config)?, policy);
    info!(
        "Chat client ready: {} (model={}, base_url={:?})",
        llm_config.llm_type,
        chat_client.get_model(),
        chat_client.get_base_url()
    );

    let prompts = match &args.prompts_path {
        Some(path) => load_prompts(path)?,
        None => builtin_prompts()?,
    };

    let assistant = CourseAssistant::new(chat_client, prompts).with_cache_ttl(
        Duration::from_secs(args.cache_ttl_secs)
    );

    let limiter = NonZeroU32::new(args.rate_limit_per_second).map(|per_second|
        Arc::new(RateLimiter::direct(Quota::per_second(per_second)))
    );

    Ok(AppState {
        assistant: Arc::new(assistant),
        verifier: Arc::new(TokenVerifier::new(args.jwt_secret.as_deref())),
        limiter,
        prompts_path: args.prompts_path.clone(),
    })
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("(adapter default)"));
    info!("LLM Max Retries: {}", args.llm_max_retries);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("(built-in)"));
    info!("JWT Signature Check: {}", args.jwt_secret.is_some());
    info!("Cache TTL (secs): {}", args.cache_ttl_secs);
    info!("Rate Limit (per second): {}", args.rate_limit_per_second);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let state = build_state(&args)?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, state, args);
    server.run().await?;

    Ok(())
}
