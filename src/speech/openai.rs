use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use super::{ SpeechSynthesizer, SynthesisError };

const DEFAULT_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// OpenAI audio speech API. The voice models detect the language from the
/// text, so the language argument is unused.
pub struct OpenAiTts {
    api_key: String,
    client: Client,
    model: String,
    voice: String,
    base_url: String,
}

impl OpenAiTts {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        voice: Option<String>,
        timeout: Duration
    ) -> Result<Self, SynthesisError> {
        if api_key.is_empty() {
            return Err(SynthesisError::Config("OpenAI TTS API key is required".into()));
        }
        Ok(Self {
            api_key,
            client: Client::builder().timeout(timeout).build()?,
            model: model.unwrap_or_else(|| "tts-1".to_string()),
            voice: voice.unwrap_or_else(|| "alloy".to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_SPEECH_URL.to_string()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiTts {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Vec<u8>, SynthesisError> {
        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let resp = self.client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("OpenAI TTS API error ({}): {}", status, body);
            return Err(SynthesisError::Api { status: status.as_u16(), body });
        }

        let audio = resp.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_json, header, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    #[test]
    fn empty_key_is_rejected() {
        let result = OpenAiTts::new(String::new(), None, None, None, Duration::from_secs(5));
        assert!(matches!(result, Err(SynthesisError::Config(_))));
    }

    #[test]
    fn defaults_to_mp3_capable_model_and_voice() {
        let tts = OpenAiTts::new("sk-test".into(), None, None, None, Duration::from_secs(5)).unwrap();
        assert_eq!(tts.model, "tts-1");
        assert_eq!(tts.voice, "alloy");
        assert_eq!(tts.provider_name(), "openai");
    }

    #[tokio::test]
    async fn posts_speech_request_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(header("authorization", "Bearer sk-test"))
            .and(
                body_json(
                    json!({"model": "tts-1", "input": "hello", "voice": "nova", "response_format": "mp3"})
                )
            )
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB]))
            .expect(1)
            .mount(&server).await;

        let tts = OpenAiTts::new(
            "sk-test".into(),
            Some(format!("{}/v1/audio/speech", server.uri())),
            None,
            Some("nova".into()),
            Duration::from_secs(5)
        ).unwrap();
        assert_eq!(tts.synthesize("hello", "en").await.unwrap(), vec![0xFF, 0xFB]);
    }

    #[tokio::test]
    async fn error_status_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server).await;

        let tts = OpenAiTts::new(
            "sk-test".into(),
            Some(server.uri()),
            None,
            None,
            Duration::from_secs(5)
        ).unwrap();
        let err = tts.synthesize("hello", "en").await.unwrap_err();
        assert!(matches!(err, SynthesisError::Api { status: 401, ref body } if body == "bad key"));
    }
}
