use crate::config::prompt::{ get_summary_prompt, PromptConfig };
use crate::history::format_history_for_prompt;
use crate::llm::{ CompletionClient, CompletionError, CompletionRequest, NO_RESPONSE_FALLBACK };
use crate::models::chat::ChatTurn;

pub const SUMMARY_TURNS: usize = 20;
pub const SUMMARY_CHAR_LIMIT: usize = 8000;

const SUMMARY_INSTRUCTIONS: &str = "You write concise, factual summaries of conversations.";

/// Rendered conversation, cut to at most `limit` characters.
pub fn summary_source(turns: &[ChatTurn], limit: usize) -> String {
    let text = format_history_for_prompt(turns);
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

/// Asks the completion API for a digest of `turns`. Returns `None` when there
/// is nothing to summarize or the API produced no text.
pub async fn summarize_turns(
    client: &dyn CompletionClient,
    config: &PromptConfig,
    turns: &[ChatTurn]
) -> Result<Option<String>, CompletionError> {
    if turns.is_empty() {
        return Ok(None);
    }

    let request = CompletionRequest {
        instructions: SUMMARY_INSTRUCTIONS.to_string(),
        input: get_summary_prompt(config, &summary_source(turns, SUMMARY_CHAR_LIMIT)),
        previous_response_id: None,
    };
    let result = client.complete(&request).await?;
    if result.message_text == NO_RESPONSE_FALLBACK || result.message_text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(result.message_text))
}
