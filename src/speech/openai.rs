//! OpenAI speech implementation.

use super::Synthesizer;
use crate::error::{KartkaError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based synthesizer.
pub struct OpenAISynthesizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
}

impl OpenAISynthesizer {
    /// Create a synthesizer for a speech model and voice name.
    pub fn with_config(
        api_key: &str,
        model: &str,
        voice: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key, timeout)?,
            model: parse_model(model)?,
            voice: parse_voice(voice)?,
        })
    }
}

fn parse_model(model: &str) -> Result<SpeechModel> {
    match model {
        "tts-1" => Ok(SpeechModel::Tts1),
        "tts-1-hd" => Ok(SpeechModel::Tts1Hd),
        other => Err(KartkaError::Config(format!("Unknown speech model: {}", other))),
    }
}

fn parse_voice(voice: &str) -> Result<Voice> {
    match voice.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        other => Err(KartkaError::Config(format!("Unknown speech voice: {}", other))),
    }
}

#[async_trait]
impl Synthesizer for OpenAISynthesizer {
    #[instrument(skip(self))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(self.model.clone())
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| KartkaError::Synthesis {
                text: text.to_string(),
                message: format!("Failed to build request: {}", e),
            })?;

        let response = self.client.audio().speech(request).await.map_err(|e| {
            KartkaError::Synthesis {
                text: text.to_string(),
                message: format!("OpenAI speech API error: {}", e),
            }
        })?;

        let audio = response.bytes.to_vec();
        debug!("Synthesized {} bytes", audio.len());
        Ok(audio)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_and_model() {
        assert!(matches!(parse_voice("Onyx"), Ok(Voice::Onyx)));
        assert!(parse_voice("robot").is_err());
        assert!(matches!(parse_model("tts-1-hd"), Ok(SpeechModel::Tts1Hd)));
        assert!(parse_model("whisper-1").is_err());
    }
}
