use async_trait::async_trait;
use log::{ debug, error };
use reqwest::Client;
use std::time::Duration;
use super::{ SpeechSynthesizer, SynthesisError };

const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;

/// Keyless translate TTS endpoint. It only accepts short inputs, so text is
/// sent in chunks and the MP3 frames are concatenated.
pub struct GoogleTranslateTts {
    client: Client,
    base_url: String,
}

impl GoogleTranslateTts {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, SynthesisError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_TTS_URL.to_string()),
        })
    }
}

/// Splits on whitespace into pieces of at most `max` characters. Words longer
/// than `max` are cut.
pub(crate) fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if word_len > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current_len + 1 + word_len <= max {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            debug!("Requesting TTS chunk {}/{}", idx, total);

            let resp = self.client
                .get(&self.base_url)
                .query(
                    &[
                        ("ie", "UTF-8"),
                        ("q", chunk.as_str()),
                        ("tl", language),
                        ("client", "tw-ob"),
                        ("total", total.as_str()),
                        ("idx", idx.as_str()),
                        ("textlen", textlen.as_str()),
                    ]
                )
                .send().await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!("TTS API error ({}): {}", status, body);
                return Err(SynthesisError::Api { status: status.as_u16(), body });
            }
            audio.extend_from_slice(&resp.bytes().await?);
        }

        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio)
    }

    fn provider_name(&self) -> &str {
        "google"
    }
}
