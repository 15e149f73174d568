use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- History Store Args ---
    /// History chat store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// History chat store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "history:")]
    pub history_redis_prefix: String,

    /// Number of recent turns inlined into the instructions in stateless mode.
    #[arg(long, env = "HISTORY_WINDOW", default_value = "10")]
    pub history_window: usize,

    // --- Completion Provider Args ---
    /// Full URL of the responses endpoint (defaults to https://api.openai.com/v1/responses)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// API Key for the completion provider
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4.1-mini")]
    pub chat_model: String,

    /// How continuity is carried: stateful (continuation id) or stateless (inlined history)
    #[arg(long, env = "COMPLETION_MODE", default_value = "stateful")]
    pub completion_mode: String,

    /// Timeout in seconds for one completion request.
    #[arg(long, env = "COMPLETION_TIMEOUT_SECS", default_value = "60")]
    pub completion_timeout_secs: u64,

    /// Path to the prompt configuration file.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,

    /// Build a context summary from recent history when the client does not send one.
    #[arg(long, env = "SUMMARIZE_HISTORY", default_value = "false")]
    pub summarize_history: bool,

    // --- Speech Args ---
    /// Text-to-speech provider (google, openai)
    #[arg(long, env = "TTS_PROVIDER", default_value = "google")]
    pub tts_provider: String,

    /// Override for the TTS endpoint URL.
    #[arg(long, env = "TTS_BASE_URL")]
    pub tts_base_url: Option<String>,

    /// API key for the openai TTS provider. Defaults to CHAT_API_KEY if not set.
    #[arg(long, env = "TTS_API_KEY")]
    pub tts_api_key: Option<String>,

    /// TTS model (openai provider only)
    #[arg(long, env = "TTS_MODEL")]
    pub tts_model: Option<String>,

    /// TTS voice (openai provider only)
    #[arg(long, env = "TTS_VOICE")]
    pub tts_voice: Option<String>,

    /// Language code passed to the synthesizer.
    #[arg(long, env = "TTS_LANGUAGE", default_value = "en")]
    pub tts_language: String,

    /// Timeout in seconds for one TTS request.
    #[arg(long, env = "TTS_TIMEOUT_SECS", default_value = "30")]
    pub tts_timeout_secs: u64,

    // --- Gamification Args ---
    /// Endpoint receiving XP awards as JSON. When unset, awards are only logged.
    #[arg(long, env = "GAMIFICATION_URL")]
    pub gamification_url: Option<String>,

    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:5050")]
    pub server_addr: String,

    /// Maximum requests per second accepted across all clients. 0 disables limiting.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u32,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
