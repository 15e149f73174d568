use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use thiserror::Error;

use crate::config::prompt::PromptError;
use crate::history::HistoryError;
use crate::llm::CompletionError;
use crate::models::api::ErrorResponse;
use crate::speech::SynthesisError;

pub const PROCESSING_FAILURE: &str = "Failed to process message";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidRequest(&'static str),

    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("history store failed: {0}")]
    History(#[from] HistoryError),

    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] PromptError),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match self {
            ChatError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
            }
            _ => {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(PROCESSING_FAILURE)),
                ).into_response()
            }
        }
    }
}
