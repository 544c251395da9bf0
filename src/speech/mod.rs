//! Speech synthesis backends.

mod google;
mod openai;

pub use google::GoogleSynthesizer;
pub use openai::OpenAISynthesizer;

use crate::config::{SpeechProvider, SpeechSettings};
use crate::error::{KartkaError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for text-to-speech services.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` and return MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Build the synthesizer selected in settings.
pub fn create_synthesizer(settings: &SpeechSettings) -> Result<Arc<dyn Synthesizer>> {
    let api_key = settings.resolve_api_key().ok_or_else(|| {
        KartkaError::Config(format!(
            "No API key for {} speech synthesis. Set speech.api_key or export {}",
            settings.provider,
            settings.api_key_env()
        ))
    })?;

    Ok(match settings.provider {
        SpeechProvider::Google => Arc::new(GoogleSynthesizer::with_config(
            &api_key,
            &settings.language_code,
            &settings.voice_gender,
            settings.timeout(),
        )?),
        SpeechProvider::OpenAI => Arc::new(OpenAISynthesizer::with_config(
            &api_key,
            &settings.model,
            &settings.voice,
            settings.timeout(),
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_synthesizer_with_configured_key() {
        let settings = SpeechSettings {
            api_key: Some("test-key".to_string()),
            ..SpeechSettings::default()
        };
        let synth = create_synthesizer(&settings).unwrap();
        assert_eq!(synth.name(), "google");

        let settings = SpeechSettings {
            api_key: Some("sk-test".to_string()),
            provider: SpeechProvider::OpenAI,
            ..SpeechSettings::default()
        };
        let synth = create_synthesizer(&settings).unwrap();
        assert_eq!(synth.name(), "openai");
    }
}
