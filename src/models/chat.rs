use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    /// Label used when a turn is replayed inside a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: u64,
    pub sender: Sender,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub turns: Vec<ChatTurn>,
}

impl UserSession {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            turns: Vec::new(),
        }
    }

    pub fn push(&mut self, sender: Sender, content: &str) -> ChatTurn {
        let turn = ChatTurn {
            id: self.turns.len() as u64,
            sender,
            content: content.to_string(),
            timestamp: Some(Utc::now()),
        };
        self.turns.push(turn.clone());
        turn
    }

    pub fn recent(&self, limit: usize) -> Vec<ChatTurn> {
        let start = self.turns.len().saturating_sub(limit);
        self.turns[start..].to_vec()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionResult {
    pub continuation_id: Option<String>,
    pub message_text: String,
}

/// Which instruction template the assistant answers with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Companion,
    Coaching,
}

impl Persona {
    pub fn for_account_type(account_type: &str) -> Self {
        if account_type == "individual" { Persona::Companion } else { Persona::Coaching }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Persona::Companion => "companion",
            Persona::Coaching => "coaching",
        }
    }
}
