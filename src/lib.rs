pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod gamification;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;
pub mod speech;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("History Store Type: {}", args.history_type);
    if !args.history_type.eq_ignore_ascii_case("memory") {
        info!("History Store Host: {}", args.history_host);
    }
    info!("Chat Model: {}", args.chat_model);
    info!("Completion Mode: {}", args.completion_mode);
    info!("History Window: {}", args.history_window);
    info!("Prompts Path: {}", args.prompts_path);
    info!("Summarize History: {}", args.summarize_history);
    info!("TTS Provider: {} ({})", args.tts_provider, args.tts_language);
    info!("Gamification URL: {}", args.gamification_url.as_deref().unwrap_or("none"));
    info!("Rate Limit: {}/s", args.rate_limit_per_second);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(ChatAgent::new(&args).await?);
    let server = Server::new(agent, args);
    server.run().await?;

    Ok(())
}
