use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{ Mutex, RwLock };
use crate::history::{ HistoryError, HistoryStore };
use crate::models::chat::{ ChatTurn, Sender, UserSession };

/// Process-wide session map. Each user has its own mutex, so concurrent
/// appends for one user are serialized while other users proceed freely.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<UserSession>>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn session(&self, user_id: &str) -> Arc<Mutex<UserSession>> {
        if let Some(existing) = self.sessions.read().await.get(user_id) {
            return Arc::clone(existing);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions.entry(user_id.to_string()).or_insert_with(|| {
                debug!("Creating session for user {}", user_id);
                Arc::new(Mutex::new(UserSession::new(user_id)))
            })
        )
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get_or_create(&self, user_id: &str) -> Result<UserSession, HistoryError> {
        let session = self.session(user_id).await;
        let guard = session.lock().await;
        Ok(guard.clone())
    }

    async fn append(
        &self,
        user_id: &str,
        sender: Sender,
        content: &str
    ) -> Result<ChatTurn, HistoryError> {
        let session = self.session(user_id).await;
        let mut guard = session.lock().await;
        Ok(guard.push(sender, content))
    }

    async fn history(&self, user_id: &str) -> Result<Vec<ChatTurn>, HistoryError> {
        let session = self.session(user_id).await;
        let guard = session.lock().await;
        Ok(guard.turns.clone())
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ChatTurn>, HistoryError> {
        let session = self.session(user_id).await;
        let guard = session.lock().await;
        Ok(guard.recent(limit))
    }
}
