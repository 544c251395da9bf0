//! Note assembly and id uniqueness.

use super::NoteRecord;
use crate::audio::AudioAssetRef;
use crate::error::{KartkaError, Result};
use std::collections::HashSet;

/// Ids accepted so far in a run.
#[derive(Debug, Default)]
pub struct IdRegistry {
    seen: HashSet<String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `id` was already claimed.
    pub fn check(&self, id: &str) -> Result<()> {
        if self.seen.contains(id) {
            return Err(KartkaError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Claim `id`, failing if it was already claimed.
    pub fn claim(&mut self, id: &str) -> Result<()> {
        if !self.seen.insert(id.to_string()) {
            return Err(KartkaError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Escaped text fields of one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFields {
    pub id: String,
    pub source_field: String,
    pub target_field: String,
    pub examples_field: String,
}

/// Builds note records, rejecting repeated ids.
#[derive(Debug, Default)]
pub struct NoteAssembler {
    registry: IdRegistry,
}

impl NoteAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail early if `id` is already used, without claiming it.
    pub fn check_unique(&self, id: &str) -> Result<()> {
        self.registry.check(id)
    }

    /// Build a note, claiming its id. Audio references keep their order.
    pub fn assemble(
        &mut self,
        fields: NormalizedFields,
        audio: &[AudioAssetRef],
    ) -> Result<NoteRecord> {
        self.registry.claim(&fields.id)?;

        let audio_field: String = audio.iter().map(AudioAssetRef::sound_tag).collect();

        Ok(NoteRecord {
            id: fields.id,
            source_field: fields.source_field,
            target_field: fields.target_field,
            examples_field: fields.examples_field,
            audio_field,
        })
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fields(id: &str) -> NormalizedFields {
        NormalizedFields {
            id: id.to_string(),
            source_field: "kot".to_string(),
            target_field: "кіт".to_string(),
            examples_field: "<ul></ul>".to_string(),
        }
    }

    fn asset(name: &str) -> AudioAssetRef {
        AudioAssetRef {
            cache_key: name.to_string(),
            file_name: format!("{name}.mp3"),
            file_path: PathBuf::from(format!("audio/{name}.mp3")),
        }
    }

    #[test]
    fn test_registry_rejects_repeat() {
        let mut registry = IdRegistry::new();
        registry.claim("1").unwrap();
        assert!(registry.check("2").is_ok());
        assert!(matches!(registry.check("1"), Err(KartkaError::DuplicateId(id)) if id == "1"));
        assert!(matches!(registry.claim("1"), Err(KartkaError::DuplicateId(id)) if id == "1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_audio_field_in_example_order() {
        let mut assembler = NoteAssembler::new();
        let note = assembler
            .assemble(fields("1"), &[asset("a"), asset("b"), asset("c")])
            .unwrap();
        assert_eq!(note.audio_field, "[sound:a.mp3][sound:b.mp3][sound:c.mp3]");
        assert_eq!(note.id, "1");
    }

    #[test]
    fn test_no_audio_gives_empty_field() {
        let mut assembler = NoteAssembler::new();
        let note = assembler.assemble(fields("1"), &[]).unwrap();
        assert_eq!(note.audio_field, "");
    }

    #[test]
    fn test_duplicate_assembly_fails() {
        let mut assembler = NoteAssembler::new();
        assembler.assemble(fields("1"), &[]).unwrap();
        assert!(assembler.check_unique("1").is_err());
        let err = assembler.assemble(fields("1"), &[]).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate ID: 1");
        assert_eq!(assembler.registry().len(), 1);
    }
}
