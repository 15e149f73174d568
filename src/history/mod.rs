mod memory;
mod redis;

pub use memory::InMemoryHistoryStore;
pub use self::redis::RedisHistoryStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error as ThisError;
use crate::cli::Args;
use crate::models::chat::{ ChatTurn, Sender, UserSession };

#[derive(Debug, ThisError)]
pub enum HistoryError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("history entry encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Per-user conversation storage. Appends for the same user are applied in
/// the order they are made and never interleave.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get_or_create(&self, user_id: &str) -> Result<UserSession, HistoryError>;

    async fn append(
        &self,
        user_id: &str,
        sender: Sender,
        content: &str
    ) -> Result<ChatTurn, HistoryError>;

    async fn history(&self, user_id: &str) -> Result<Vec<ChatTurn>, HistoryError>;

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ChatTurn>, HistoryError> {
        let turns = self.history(user_id).await?;
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(InMemoryHistoryStore::new())),
        "redis" => {
            let store = RedisHistoryStore::new(&args.history_host, &args.history_redis_prefix)?;
            Ok(Arc::new(store))
        }
        other => Err(format!("Unsupported history store type: {}", other).into()),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    if args.history_type.eq_ignore_ascii_case("memory") {
        info!("Chat history will be kept in process memory");
    } else {
        info!("Chat history will be stored in: {} at {}", args.history_type, args.history_host);
    }
    create_history_store(args)
}

/// Renders turns as `User:` / `Assistant:` lines, oldest first.
pub fn format_history_for_prompt(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.sender.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}
