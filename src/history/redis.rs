use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use log::error;
use redis::{ Client, AsyncCommands };
use serde::{ Serialize, Deserialize };
use crate::history::{ HistoryError, HistoryStore };
use crate::models::chat::{ ChatTurn, Sender, UserSession };

#[derive(Serialize, Deserialize)]
struct StoredTurn {
    sender: Sender,
    content: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

/// One Redis list per user. `RPUSH` is atomic, so same-user appends are
/// serialized by the server and the list index doubles as the turn id.
pub struct RedisHistoryStore {
    client: Client,
    key_prefix: String,
}

impl RedisHistoryStore {
    pub fn new(host: &str, key_prefix: &str) -> Result<Self, HistoryError> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn get_or_create(&self, user_id: &str) -> Result<UserSession, HistoryError> {
        Ok(UserSession {
            user_id: user_id.to_string(),
            turns: self.history(user_id).await?,
        })
    }

    async fn append(
        &self,
        user_id: &str,
        sender: Sender,
        content: &str
    ) -> Result<ChatTurn, HistoryError> {
        let mut conn = self.get_connection().await?;
        let timestamp = Utc::now();
        let stored = StoredTurn {
            sender,
            content: content.to_string(),
            timestamp: Some(timestamp),
        };

        let json_turn = serde_json::to_string(&stored)?;
        let len: u64 = conn.rpush(self.key(user_id), &json_turn).await?;

        Ok(ChatTurn {
            id: len.saturating_sub(1),
            sender,
            content: stored.content,
            timestamp: Some(timestamp),
        })
    }

    async fn history(&self, user_id: &str) -> Result<Vec<ChatTurn>, HistoryError> {
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn.lrange(self.key(user_id), 0, -1).await?;
        let mut turns = Vec::with_capacity(json_entries.len());

        for (idx, json_entry) in json_entries.iter().enumerate() {
            match serde_json::from_str::<StoredTurn>(json_entry) {
                Ok(stored) => {
                    turns.push(ChatTurn {
                        id: idx as u64,
                        sender: stored.sender,
                        content: stored.content,
                        timestamp: stored.timestamp,
                    });
                }
                Err(e) => {
                    error!("Error parsing history entry {} for {}: {}", idx, user_id, e);
                }
            }
        }

        Ok(turns)
    }
}
