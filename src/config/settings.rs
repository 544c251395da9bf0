//! Configuration settings for Kartka.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub input: InputSettings,
    pub deck: DeckSettings,
    pub speech: SpeechSettings,
    pub movapp: MovappSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where deck packages are written.
    pub output_dir: String,
    /// Directory holding synthesized audio (the audio cache).
    pub audio_dir: String,
    /// Log level when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            audio_dir: "output/audio".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// JSON key names used to read vocabulary entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputSettings {
    pub id_field: String,
    pub source_field: String,
    pub target_field: String,
    pub examples_field: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            source_field: "source".to_string(),
            target_field: "target".to_string(),
            examples_field: "examples".to_string(),
        }
    }
}

/// Deck and note model identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckSettings {
    pub deck_id: i64,
    pub deck_name: String,
    pub model_id: i64,
    pub model_name: String,
    /// Field label for the source-language word (e.g. "PL").
    pub source_label: String,
    /// Field label for the target-language translation (e.g. "UA").
    pub target_label: String,
    /// File name of the package written into the output directory.
    pub package_name: String,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            deck_id: 1426754026,
            deck_name: "PL-UA Deck".to_string(),
            model_id: 1864309187,
            model_name: "PL-UA Model".to_string(),
            source_label: "PL".to_string(),
            target_label: "UA".to_string(),
            package_name: "plua.apkg".to_string(),
        }
    }
}

/// Speech synthesis provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    /// Google Cloud Text-to-Speech (default).
    #[default]
    Google,
    /// OpenAI speech endpoint.
    OpenAI,
}

impl std::str::FromStr for SpeechProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gcp" => Ok(SpeechProvider::Google),
            "openai" => Ok(SpeechProvider::OpenAI),
            _ => Err(format!("Unknown speech provider: {}", s)),
        }
    }
}

impl std::fmt::Display for SpeechProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechProvider::Google => write!(f, "google"),
            SpeechProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Generate audio for examples.
    pub enabled: bool,
    pub provider: SpeechProvider,
    /// BCP-47 language of the example sentences (Google).
    pub language_code: String,
    /// SSML voice gender (Google).
    pub voice_gender: String,
    /// Voice name (OpenAI).
    pub voice: String,
    /// Speech model (OpenAI).
    pub model: String,
    /// API key. Falls back to GOOGLE_TTS_API_KEY / OPENAI_API_KEY.
    pub api_key: Option<String>,
    /// Per-request timeout. Zero disables it.
    pub timeout_seconds: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: SpeechProvider::Google,
            language_code: "pl-PL".to_string(),
            voice_gender: "MALE".to_string(),
            voice: "onyx".to_string(),
            model: "tts-1".to_string(),
            api_key: None,
            timeout_seconds: 60,
        }
    }
}

impl SpeechSettings {
    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(&self) -> &'static str {
        match self.provider {
            SpeechProvider::Google => "GOOGLE_TTS_API_KEY",
            SpeechProvider::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Resolve the API key from settings or the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(self.api_key_env()).ok().filter(|k| !k.is_empty()))
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_seconds > 0).then(|| std::time::Duration::from_secs(self.timeout_seconds))
    }
}

/// Movapp phrasebook import settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovappSettings {
    /// Root of the movapp-data checkout (its `data` directory).
    pub data_dir: String,
    pub dictionary_file: String,
    pub sounds_dir: String,
    /// Prefix stripped from sound URLs to get a path under `sounds_dir`.
    pub sound_url_prefix: String,
    pub deck_id: i64,
    pub deck_name: String,
    pub model_id: i64,
    pub model_name: String,
    pub package_name: String,
}

impl Default for MovappSettings {
    fn default() -> Self {
        Self {
            data_dir: "./movapp-data/data".to_string(),
            dictionary_file: "uk-pl-dictionary.json".to_string(),
            sounds_dir: "pl-sounds".to_string(),
            sound_url_prefix: "https://data.movapp.eu/pl-sounds/".to_string(),
            deck_id: 1426754026,
            deck_name: "Polish-Ukrainian Movapp Deck".to_string(),
            model_id: 4864239187,
            model_name: "Polish-Ukrainian Movapp Model".to_string(),
            package_name: "plua-movapp.apkg".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| crate::error::KartkaError::io(&config_path, e))?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KartkaError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| crate::error::KartkaError::io(path, e))?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kartka")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded audio cache directory path.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.audio_dir)
    }

    /// Get the expanded movapp data directory path.
    pub fn movapp_dir(&self) -> PathBuf {
        Self::expand_path(&self.movapp.data_dir)
    }
}
