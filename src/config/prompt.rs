use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::info;
use crate::models::chat::Persona;

const CONTEXT_SUMMARY_PLACEHOLDER: &str = "{context_summary}";

#[derive(Debug)]
pub enum PromptError {
    TemplateNotFound(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::TemplateNotFound(key) => write!(f, "Prompt template '{}' not found", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

fn default_context_block() -> String {
    "CONTEXT SUMMARY:\n{summary}".to_string()
}

fn default_history_block() -> String {
    "RECENT CONVERSATION:\n{history}".to_string()
}

fn default_summary_request() -> String {
    "Summarize the following conversation history in a detailed paragraph focusing on user concerns, themes, and assistant responses:\n\n{conversation}".to_string()
}

/// Persona instruction templates, kept outside the binary so they can be
/// revised without a redeploy.
#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    #[serde(default)]
    pub version: Option<String>,
    pub personas: HashMap<String, String>,
    #[serde(default = "default_context_block")]
    pub context_block: String,
    #[serde(default = "default_history_block")]
    pub history_block: String,
    #[serde(default = "default_summary_request")]
    pub summary_request: String,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        for persona in [Persona::Companion, Persona::Coaching] {
            if !self.personas.contains_key(persona.key()) {
                return Err(PromptError::TemplateNotFound(format!("personas:{}", persona.key())));
            }
        }
        Ok(())
    }

    fn persona_template(&self, persona: Persona) -> Result<&str, PromptError> {
        self.personas
            .get(persona.key())
            .map(|s| s.as_str())
            .ok_or_else(|| PromptError::TemplateNotFound(format!("personas:{}", persona.key())))
    }
}

pub fn load_prompts_from_str(json: &str) -> Result<PromptConfig, PromptError> {
    let mut config: PromptConfig = serde_json::from_str(json)?;
    config.validate()?;
    config.last_loaded = Some(SystemTime::now());
    Ok(config)
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path.as_ref())?;
    let config = load_prompts_from_str(&file_content)?;
    info!(
        "Loaded prompts from {} (version {})",
        path.as_ref().display(),
        config.version.as_deref().unwrap_or("unversioned")
    );
    Ok(Arc::new(config))
}

async fn read_prompts_file(path: &Path) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = tokio::fs::read_to_string(path).await?;
    let config = load_prompts_from_str(&file_content)?;
    info!(
        "Reloaded prompts from {} (version {})",
        path.display(),
        config.version.as_deref().unwrap_or("unversioned")
    );
    Ok(Arc::new(config))
}

/// Checked on the request path, so file access goes through `tokio::fs`.
pub async fn reload_prompts_if_changed<P: AsRef<Path>>(
    path: P,
    current_config: &Arc<PromptConfig>
) -> Result<Option<Arc<PromptConfig>>, PromptError> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path).await?;

    if let Ok(modified) = metadata.modified() {
        match current_config.last_loaded {
            Some(last_loaded) if modified <= last_loaded => {}
            Some(_) => {
                info!("Prompts file changed, reloading...");
                return Ok(Some(read_prompts_file(path).await?));
            }
            None => {
                info!("No last_loaded timestamp, reloading prompts...");
                return Ok(Some(read_prompts_file(path).await?));
            }
        }
    }
    Ok(None)
}

/// Builds the system instructions for one completion call. The context
/// summary goes where the template puts `{context_summary}`; recent turns, if
/// any, are appended after it.
pub fn render_instructions(
    config: &PromptConfig,
    persona: Persona,
    context_summary: Option<&str>,
    recent_history: Option<&str>
) -> Result<String, PromptError> {
    let template = config.persona_template(persona)?;

    let summary_block = match context_summary.filter(|s| !s.trim().is_empty()) {
        Some(summary) => config.context_block.replace("{summary}", summary),
        None => String::new(),
    };

    let mut instructions = if template.contains(CONTEXT_SUMMARY_PLACEHOLDER) {
        template.replace(CONTEXT_SUMMARY_PLACEHOLDER, &summary_block)
    } else if summary_block.is_empty() {
        template.to_string()
    } else {
        format!("{}\n\n{}", template, summary_block)
    };

    if let Some(history) = recent_history.filter(|h| !h.is_empty()) {
        instructions.push_str("\n\n");
        instructions.push_str(&config.history_block.replace("{history}", history));
    }

    Ok(instructions)
}

pub fn get_summary_prompt(config: &PromptConfig, conversation: &str) -> String {
    config.summary_request.replace("{conversation}", conversation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPTS: &str = r#"{
        "version": "test",
        "personas": {
            "companion": "You are a companion.\n{context_summary}",
            "coaching": "You are a coach."
        }
    }"#;

    fn config() -> PromptConfig {
        load_prompts_from_str(PROMPTS).unwrap()
    }

    #[test]
    fn missing_persona_is_rejected() {
        let err = load_prompts_from_str(r#"{"personas": {"companion": "x"}}"#).unwrap_err();
        assert!(matches!(err, PromptError::TemplateNotFound(ref k) if k == "personas:coaching"));
    }

    #[test]
    fn absent_summary_renders_empty_block() {
        let out = render_instructions(&config(), Persona::Companion, None, None).unwrap();
        assert_eq!(out, "You are a companion.\n");
    }

    #[test]
    fn summary_is_interpolated_verbatim() {
        let out = render_instructions(
            &config(),
            Persona::Companion,
            Some("User is preparing for a job interview."),
            None
        ).unwrap();
        assert!(out.ends_with("CONTEXT SUMMARY:\nUser is preparing for a job interview."));
    }

    #[test]
    fn summary_is_appended_when_template_has_no_placeholder() {
        let out = render_instructions(&config(), Persona::Coaching, Some("notes"), None).unwrap();
        assert_eq!(out, "You are a coach.\n\nCONTEXT SUMMARY:\nnotes");
    }

    #[test]
    fn recent_history_follows_the_persona_text() {
        let out = render_instructions(
            &config(),
            Persona::Coaching,
            None,
            Some("User: hi\nAssistant: hello")
        ).unwrap();
        assert_eq!(out, "You are a coach.\n\nRECENT CONVERSATION:\nUser: hi\nAssistant: hello");
    }

    #[test]
    fn summary_keeps_surrounding_whitespace() {
        let out = render_instructions(&config(), Persona::Coaching, Some("  notes\n"), None).unwrap();
        assert_eq!(out, "You are a coach.\n\nCONTEXT SUMMARY:\n  notes\n");
    }

    #[test]
    fn blank_summary_is_treated_as_absent() {
        let out = render_instructions(&config(), Persona::Coaching, Some(" \n "), None).unwrap();
        assert_eq!(out, "You are a coach.");
    }

    #[test]
    fn summary_prompt_embeds_conversation() {
        let prompt = get_summary_prompt(&config(), "User: hi");
        assert!(prompt.ends_with("User: hi"));
    }

    #[test]
    fn bundled_prompts_file_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/json/prompts.json");
        let config = load_prompts(path).unwrap();
        assert!(config.personas.contains_key("companion"));
        assert!(config.personas.contains_key("coaching"));
    }

    #[tokio::test]
    async fn reload_skips_unchanged_file_and_picks_up_edits() {
        let path = std::env::temp_dir().join(format!("prompts-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, PROMPTS).unwrap();
        let current = load_prompts(&path).unwrap();

        assert!(reload_prompts_if_changed(&path, &current).await.unwrap().is_none());

        let stale = Arc::new(PromptConfig { last_loaded: None, ..(*current).clone() });
        let reloaded = reload_prompts_if_changed(&path, &stale).await.unwrap().unwrap();
        assert_eq!(reloaded.version.as_deref(), Some("test"));

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            reload_prompts_if_changed(&path, &current).await,
            Err(PromptError::IoError(_))
        ));
    }
}
