//! Google Cloud Text-to-Speech implementation.

use super::Synthesizer;
use crate::error::{KartkaError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Google Cloud TTS over the REST API.
pub struct GoogleSynthesizer {
    client: Client,
    endpoint: String,
    api_key: String,
    language_code: String,
    voice_gender: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    ssml_gender: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl GoogleSynthesizer {
    /// Create a synthesizer for a language and SSML voice gender.
    pub fn with_config(
        api_key: &str,
        language_code: &str,
        voice_gender: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            language_code: language_code.to_string(),
            voice_gender: voice_gender.to_uppercase(),
        })
    }

    /// Point the synthesizer at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                ssml_gender: &self.voice_gender,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        }
    }
}

fn synthesis_error(text: &str, message: impl Into<String>) -> KartkaError {
    KartkaError::Synthesis {
        text: text.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl Synthesizer for GoogleSynthesizer {
    #[instrument(skip(self), fields(language = %self.language_code))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| synthesis_error(text, format!("Google TTS request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(synthesis_error(
                text,
                format!("Google TTS returned {status}: {body}"),
            ));
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| synthesis_error(text, format!("Invalid Google TTS response: {e}")))?;

        let audio = general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| synthesis_error(text, format!("Invalid audio content: {e}")))?;

        if audio.is_empty() {
            return Err(synthesis_error(text, "Google TTS returned empty audio"));
        }

        debug!("Synthesized {} bytes", audio.len());
        Ok(audio)
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let synth = GoogleSynthesizer::with_config("key", "pl-PL", "male", None).unwrap();
        let body = serde_json::to_value(synth.request_body("To jest kot.")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "input": {"text": "To jest kot."},
                "voice": {"languageCode": "pl-PL", "ssmlGender": "MALE"},
                "audioConfig": {"audioEncoding": "MP3"}
            })
        );
    }

    #[test]
    fn test_response_decoding() {
        let parsed: SynthesizeResponse =
            serde_json::from_str(r#"{"audioContent": "SUQz"}"#).unwrap();
        let audio = general_purpose::STANDARD.decode(parsed.audio_content).unwrap();
        assert_eq!(audio, b"ID3");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_synthesis_error() {
        let timeout = Some(Duration::from_secs(2));
        let synth = GoogleSynthesizer::with_config("key", "pl-PL", "MALE", timeout)
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/v1/text:synthesize");
        let err = synth.synthesize("Dzień dobry").await.unwrap_err();
        match err {
            KartkaError::Synthesis { text, .. } => assert_eq!(text, "Dzień dobry"),
            other => panic!("expected synthesis error, got {other:?}"),
        }
    }
}
