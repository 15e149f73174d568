use async_trait::async_trait;
use log::{ debug, error };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ CompletionClient, CompletionError, CompletionRequest, LlmConfig, NO_RESPONSE_FALLBACK };
use crate::models::chat::CompletionResult;

const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

pub struct OpenAIResponsesClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct OpenAIResponsesResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    output: Vec<OpenAIOutputItem>,
}

#[derive(Deserialize, Debug)]
struct OpenAIOutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<OpenAIContentBlock>,
}

#[derive(Deserialize, Debug)]
struct OpenAIContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl OpenAIResponsesResponse {
    /// First text block of the first non-empty `message` item.
    pub(crate) fn output_text(&self) -> Option<&str> {
        self.output
            .iter()
            .filter(|item| item.item_type == "message")
            .find_map(|item| item.content.first().and_then(|block| block.text.as_deref()))
    }

    pub(crate) fn into_result(self) -> CompletionResult {
        let message_text = self
            .output_text()
            .unwrap_or(NO_RESPONSE_FALLBACK)
            .to_string();
        CompletionResult {
            continuation_id: self.id,
            message_text,
        }
    }
}

impl OpenAIResponsesClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: std::time::Duration
    ) -> Result<Self, CompletionError> {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = base_url.unwrap_or_else(|| DEFAULT_RESPONSES_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                CompletionError::Config(format!("Invalid API key format: {}", e))
            )?
        );

        let http = HttpClient::builder().default_headers(headers).timeout(timeout).build()?;

        Ok(Self { http, model, base_url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| CompletionError::Config("OpenAI API key is required".to_string()))?;

        Self::new(api_key, config.model.clone(), config.base_url.clone(), config.timeout)
    }
}

#[async_trait]
impl CompletionClient for OpenAIResponsesClient {
    async fn complete(
        &self,
        request: &CompletionRequest
    ) -> Result<CompletionResult, CompletionError> {
        let body = OpenAIResponsesRequest {
            model: &self.model,
            instructions: &request.instructions,
            input: &request.input,
            previous_response_id: request.previous_response_id.as_deref(),
        };
        debug!(
            "Sending completion request (model={}, chained={})",
            self.model,
            body.previous_response_id.is_some()
        );

        let resp = self.http.post(&self.base_url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            error!("Completion API error ({}): {}", status, text);
            return Err(CompletionError::Api { status: status.as_u16(), body: text });
        }

        let parsed: OpenAIResponsesResponse = serde_json::from_str(&text)?;
        Ok(parsed.into_result())
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
