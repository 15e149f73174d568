use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig, PromptError };
use crate::error::ChatError;
use crate::gamification::{ create_notifier, XpNotifier, CHAT_XP_POINTS, CHAT_XP_REASON };
use crate::history::{ format_history_for_prompt, initialize_history_store, HistoryStore };
use crate::llm::summary::{ summarize_turns, SUMMARY_TURNS };
use crate::llm::{ new_client, CompletionClient, CompletionMode, CompletionRequest, LlmConfig };
use crate::models::api::{ ChatRequest, DEFAULT_ACCOUNT_TYPE, DEFAULT_USER_ID };
use crate::models::chat::{ ChatTurn, CompletionResult, Persona, Sender };
use crate::speech::{ audio_data_uri, create_synthesizer, SpeechSynthesizer };

use log::{ info, warn, error, debug };
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub completion_mode: CompletionMode,
    pub history_window: usize,
    pub summarize_history: bool,
    pub tts_language: String,
    /// Prompt file watched for changes; `None` keeps the loaded config fixed.
    pub prompts_path: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            completion_mode: CompletionMode::Stateful,
            history_window: 10,
            summarize_history: false,
            tts_language: "en".to_string(),
            prompts_path: None,
        }
    }
}

/// Result of one successful chat turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub message_text: String,
    pub continuation_id: Option<String>,
    pub audio: Option<String>,
}

pub struct ChatAgent {
    completion_client: Arc<dyn CompletionClient>,
    history_store: Arc<dyn HistoryStore>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    xp_notifier: Arc<dyn XpNotifier>,
    prompt_config: RwLock<Arc<PromptConfig>>,
    settings: AgentSettings,
}

impl ChatAgent {
    pub fn from_parts(
        completion_client: Arc<dyn CompletionClient>,
        history_store: Arc<dyn HistoryStore>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        xp_notifier: Arc<dyn XpNotifier>,
        prompt_config: Arc<PromptConfig>,
        settings: AgentSettings
    ) -> Self {
        Self {
            completion_client,
            history_store,
            synthesizer,
            xp_notifier,
            prompt_config: RwLock::new(prompt_config),
            settings,
        }
    }

    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let completion_mode = args.completion_mode
            .parse::<CompletionMode>()
            .map_err(|e| format!("Invalid completion mode: {}", e))?;

        let llm_config = LlmConfig {
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
            model: Some(args.chat_model.clone()),
            base_url: args.chat_base_url.clone(),
            timeout: Duration::from_secs(args.completion_timeout_secs),
        };
        let completion_client = new_client(&llm_config)?;
        info!(
            "Completion client configured: Model={}, BaseURL={}, Mode={:?}",
            completion_client.get_model(),
            llm_config.base_url.as_deref().unwrap_or("default"),
            completion_mode
        );

        let history_store = initialize_history_store(args)?;
        let synthesizer = create_synthesizer(args)?;
        info!("Speech synthesizer configured: {}", synthesizer.provider_name());
        let xp_notifier = create_notifier(args.gamification_url.as_deref())?;
        let prompt_config = prompt::load_prompts(&args.prompts_path)?;

        let settings = AgentSettings {
            completion_mode,
            history_window: args.history_window,
            summarize_history: args.summarize_history,
            tts_language: args.tts_language.clone(),
            prompts_path: Some(PathBuf::from(&args.prompts_path)),
        };

        Ok(
            Self::from_parts(
                completion_client,
                history_store,
                synthesizer,
                xp_notifier,
                prompt_config,
                settings
            )
        )
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Re-reads the prompt file if it changed since the last load. Returns
    /// whether a new config was installed.
    pub async fn reload_prompts_if_changed(&self) -> Result<bool, PromptError> {
        let Some(path) = self.settings.prompts_path.as_ref() else {
            return Ok(false);
        };
        let current = self.prompt_config.read().await.clone();
        match prompt::reload_prompts_if_changed(path, &current).await? {
            Some(new_config) => {
                *self.prompt_config.write().await = new_config;
                info!("Prompt templates reloaded from {}", path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// One completion call with the persona's instructions. `recent_history`
    /// is inlined only when non-empty.
    pub async fn complete(
        &self,
        message: &str,
        continuation_id: Option<&str>,
        persona: Persona,
        context_summary: Option<&str>,
        recent_history: &[ChatTurn]
    ) -> Result<CompletionResult, ChatError> {
        let prompt_config = self.prompt_config.read().await.clone();
        let history_text = format_history_for_prompt(recent_history);
        let instructions = prompt::render_instructions(
            &prompt_config,
            persona,
            context_summary,
            Some(history_text.as_str())
        )?;

        let request = CompletionRequest {
            instructions,
            input: message.to_string(),
            previous_response_id: continuation_id.map(str::to_string),
        };
        Ok(self.completion_client.complete(&request).await?)
    }

    pub async fn process_message(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let message = request.message.as_deref().map(str::trim).unwrap_or_default();
        if message.is_empty() {
            return Err(ChatError::InvalidRequest("Message is required"));
        }
        let user_id = request.user_id.as_deref().unwrap_or(DEFAULT_USER_ID);
        let account_type = request.account_type.as_deref().unwrap_or(DEFAULT_ACCOUNT_TYPE);

        if let Err(e) = self.reload_prompts_if_changed().await {
            warn!("Prompt reload failed, keeping current templates: {}", e);
        }

        let stateless = self.settings.completion_mode == CompletionMode::Stateless;
        let needs_summary = self.settings.summarize_history &&
            request.context_summary.as_deref().map_or(true, |s| s.trim().is_empty());
        let lookback = match (stateless, needs_summary) {
            (true, true) => self.settings.history_window.max(SUMMARY_TURNS),
            (true, false) => self.settings.history_window,
            (false, true) => SUMMARY_TURNS,
            (false, false) => 0,
        };
        let prior_turns = if lookback > 0 {
            self.history_store.recent(user_id, lookback).await?
        } else {
            Vec::new()
        };

        self.history_store.append(user_id, Sender::User, message).await?;
        let persona = Persona::for_account_type(account_type);
        debug!("Persona for {}: {:?}", user_id, persona);

        let generated_summary = if needs_summary {
            self.summarize(user_id, &prior_turns).await
        } else {
            None
        };
        let context_summary = generated_summary.as_deref().or(request.context_summary.as_deref());

        let (continuation_id, context_turns) = if stateless {
            let start = prior_turns.len().saturating_sub(self.settings.history_window);
            (None, &prior_turns[start..])
        } else {
            (request.previous_response_id.as_deref(), &prior_turns[..0])
        };

        let result = self
            .complete(message, continuation_id, persona, context_summary, context_turns).await
            .map_err(|e| {
                error!("Completion failed for {}: {}", user_id, e);
                e
            })?;

        self.history_store.append(user_id, Sender::Assistant, &result.message_text).await?;

        // The assistant turn stays recorded even if synthesis fails below.
        let audio = if request.speak.unwrap_or(false) {
            let bytes = self.synthesizer
                .synthesize(&result.message_text, &self.settings.tts_language).await
                .map_err(|e| {
                    error!("Speech synthesis failed for {}: {}", user_id, e);
                    e
                })?;
            Some(audio_data_uri(&bytes))
        } else {
            None
        };

        self.xp_notifier.award_xp(user_id, CHAT_XP_POINTS, CHAT_XP_REASON);

        Ok(ChatReply {
            message_text: result.message_text,
            continuation_id: result.continuation_id,
            audio,
        })
    }

    pub async fn chat_history(&self, user_id: &str) -> Result<Vec<ChatTurn>, ChatError> {
        Ok(self.history_store.history(user_id).await?)
    }

    async fn summarize(&self, user_id: &str, prior_turns: &[ChatTurn]) -> Option<String> {
        let start = prior_turns.len().saturating_sub(SUMMARY_TURNS);
        let prompt_config = self.prompt_config.read().await.clone();
        match
            summarize_turns(
                self.completion_client.as_ref(),
                &prompt_config,
                &prior_turns[start..]
            ).await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Context summary for {} failed, continuing without it: {}", user_id, e);
                None
            }
        }
    }
}
