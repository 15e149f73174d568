pub mod openai;
pub mod summary;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::models::chat::CompletionResult;
use self::openai::OpenAIResponsesClient;

pub const NO_RESPONSE_FALLBACK: &str = "No response found.";

/// How conversation continuity is carried to the completion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// Recent turns are inlined into the instructions on every call.
    Stateless,
    /// The API keeps the conversation; calls chain through a continuation id.
    Stateful,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseCompletionModeError {
    message: String,
}

impl fmt::Display for ParseCompletionModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseCompletionModeError {}

impl FromStr for CompletionMode {
    type Err = ParseCompletionModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stateless" => Ok(CompletionMode::Stateless),
            "stateful" => Ok(CompletionMode::Stateful),
            _ =>
                Err(ParseCompletionModeError {
                    message: format!("Invalid completion mode: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion API returned status {status}")]
    Api {
        status: u16,
        body: String,
    },

    #[error("malformed completion response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid completion client configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub instructions: String,
    pub input: String,
    pub previous_response_id: Option<String>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest
    ) -> Result<CompletionResult, CompletionError>;

    fn get_model(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    let client = OpenAIResponsesClient::from_config(config)?;
    Ok(Arc::new(client))
}
