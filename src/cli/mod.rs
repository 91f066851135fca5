use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (gemini, openai, ollama, groq)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "gemini")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (e.g., Google, OpenAI, Groq)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-pro, gpt-4o, llama3)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Retries after a failed model call. 0 disables retrying.
    #[arg(long, env = "LLM_MAX_RETRIES", default_value = "0")]
    pub llm_max_retries: u32,

    /// Base delay in milliseconds before the first retry; doubles each attempt.
    #[arg(long, env = "LLM_RETRY_BASE_MS", default_value = "1000")]
    pub llm_retry_base_ms: u64,

    // --- Auth Args ---
    /// HS256 secret used to verify access tokens. If unset, tokens are decoded without signature checks.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Path to the prompt configuration file. Built-in templates are used if unset.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    // --- Caching Args ---
    /// Time-to-live in seconds for cached stage replies. 0 disables the cache.
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "0")]
    pub cache_ttl_secs: u64,

    /// Generation requests allowed per second across all clients. 0 disables limiting.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "0")]
    pub rate_limit_per_second: u32,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
