//! Deterministic naming of synthesized audio.

use sha2::{Digest, Sha256};

/// Extension of every synthesized audio file.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Cache key and file name for one (note, example) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioKey {
    /// Hex digest of the example text.
    pub key: String,
    /// `{note_id}_{key}.mp3`
    pub file_name: String,
}

/// Hex SHA-256 of the UTF-8 bytes of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive the cache key and file name for an example of a note.
///
/// The note id is part of the name so identical sentences in two notes never
/// share a file.
pub fn derive(note_id: &str, example_text: &str) -> AudioKey {
    let key = content_hash(example_text);
    let file_name = format!("{}_{}.{}", note_id, key, AUDIO_EXTENSION);
    AudioKey { key, file_name }
}
