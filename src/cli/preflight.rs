//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and the output location are usable before a
//! build starts synthesizing, so a run does not fail after many paid calls.

use crate::config::SpeechSettings;
use crate::error::{KartkaError, Result};
use std::path::Path;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Building with audio needs an API key and a writable output directory.
    BuildWithAudio,
    /// Building without audio only needs a writable output directory.
    Build,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, speech: &SpeechSettings, output_dir: &Path) -> Result<()> {
    if let Operation::BuildWithAudio = operation {
        check_api_key(speech)?;
    }
    check_output_dir(output_dir)
}

/// Check that a speech API key is configured.
pub fn check_api_key(speech: &SpeechSettings) -> Result<()> {
    match speech.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(KartkaError::Config(format!(
            "No {} API key. Set speech.api_key or export {}='...'",
            speech.provider,
            speech.api_key_env()
        ))),
    }
}

/// Check that packages can be written into `dir`, creating it if needed.
pub fn check_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| KartkaError::io(dir, e))?;
    tempfile::tempfile_in(dir).map_err(|e| KartkaError::io(dir, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_audio_needs_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let speech = SpeechSettings {
            api_key: None,
            ..SpeechSettings::default()
        };
        assert!(check(Operation::Build, &speech, &out).is_ok());
        assert!(out.is_dir());
    }

    #[test]
    fn test_configured_key_passes() {
        let speech = SpeechSettings {
            api_key: Some("key".to_string()),
            ..SpeechSettings::default()
        };
        assert!(check_api_key(&speech).is_ok());
    }

    #[test]
    fn test_output_dir_under_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, b"").unwrap();
        let err = check_output_dir(&file.join("out")).unwrap_err();
        assert!(matches!(err, KartkaError::Io { .. }));
    }
}
