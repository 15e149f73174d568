use chrono::Utc;
use serde::{ Serialize, Deserialize };
use crate::models::chat::ChatTurn;

pub const DEFAULT_USER_ID: &str = "demo_user";
pub const DEFAULT_ACCOUNT_TYPE: &str = "individual";

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub speak: Option<bool>,
    #[serde(default)]
    pub previous_response_id: Option<String>,
    #[serde(default)]
    pub context_summary: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub message: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct HistoryQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct HistoryRecord {
    pub id: String,
    pub content: String,
    pub sender: String,
    pub timestamp: String,
}

impl From<&ChatTurn> for HistoryRecord {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            id: format!("db_{}", turn.id),
            content: turn.content.clone(),
            sender: turn.sender.to_string(),
            timestamp: turn.timestamp.unwrap_or_else(Utc::now).to_rfc3339(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<HistoryRecord>,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { success: false, error: error.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Sender;

    #[test]
    fn history_record_prefixes_id_and_defaults_timestamp() {
        let turn = ChatTurn {
            id: 3,
            sender: Sender::Assistant,
            content: "hello".into(),
            timestamp: None,
        };
        let record = HistoryRecord::from(&turn);
        assert_eq!(record.id, "db_3");
        assert_eq!(record.sender, "assistant");
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn chat_request_fields_are_optional() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));
        assert!(req.user_id.is_none());
        assert!(req.speak.is_none());
    }

    #[test]
    fn null_speak_reads_as_absent() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi","speak":null}"#).unwrap();
        assert!(req.speak.is_none());
    }
}
