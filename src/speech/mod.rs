//! Text-to-speech for assistant replies.
//!
//! Providers return MP3 bytes; the HTTP layer embeds them as a data URI.

mod google;
mod openai;

pub use google::GoogleTranslateTts;
pub use openai::OpenAiTts;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error as ThisError;
use crate::cli::Args;

#[derive(Debug, ThisError)]
pub enum SynthesisError {
    #[error("speech transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("speech API returned status {status}")]
    Api {
        status: u16,
        body: String,
    },

    #[error("speech API returned no audio")]
    EmptyAudio,

    #[error("invalid speech configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// MP3-encoded speech for `text`.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError>;

    fn provider_name(&self) -> &str;
}

pub fn audio_data_uri(audio: &[u8]) -> String {
    format!("data:audio/mp3;base64,{}", STANDARD.encode(audio))
}

pub fn create_synthesizer(
    args: &Args
) -> Result<Arc<dyn SpeechSynthesizer>, Box<dyn Error + Send + Sync>> {
    let timeout = Duration::from_secs(args.tts_timeout_secs);
    match args.tts_provider.to_lowercase().as_str() {
        "google" => Ok(Arc::new(GoogleTranslateTts::new(args.tts_base_url.clone(), timeout)?)),
        "openai" => {
            let api_key = args.tts_api_key
                .clone()
                .filter(|k| !k.is_empty())
                .or_else(|| Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()))
                .ok_or("TTS_API_KEY (or CHAT_API_KEY) is required for the openai TTS provider")?;
            let tts = OpenAiTts::new(
                api_key,
                args.tts_base_url.clone(),
                args.tts_model.clone(),
                args.tts_voice.clone(),
                timeout
            )?;
            Ok(Arc::new(tts))
        }
        other => Err(format!("Unsupported TTS provider: {}. Supported: google, openai", other).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_has_mp3_prefix_and_base64_payload() {
        let uri = audio_data_uri(&[0xFF, 0xFB, 0x90, 0x64]);
        assert_eq!(uri, "data:audio/mp3;base64,//uQZA==");
    }
}
