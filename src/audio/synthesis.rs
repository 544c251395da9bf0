//! Cache-first speech synthesis for example sentences.

use super::cache::AudioCache;
use super::key::derive;
use crate::error::Result;
use crate::speech::Synthesizer;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A cached audio file referenced by a note.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAssetRef {
    /// Content hash of the example text.
    pub cache_key: String,
    /// File name as referenced from the note (`[sound:...]`).
    pub file_name: String,
    /// Where the file lives, for bundling into the package.
    pub file_path: PathBuf,
}

impl AudioAssetRef {
    /// Reference markup understood by the flashcard player.
    pub fn sound_tag(&self) -> String {
        format!("[sound:{}]", self.file_name)
    }
}

/// Ensures audio exists for each example, synthesizing only on cache misses.
pub struct SynthesisOrchestrator {
    synthesizer: Arc<dyn Synthesizer>,
    cache: Arc<dyn AudioCache>,
    synthesized: AtomicUsize,
    cache_hits: AtomicUsize,
}

impl SynthesisOrchestrator {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, cache: Arc<dyn AudioCache>) -> Self {
        Self {
            synthesizer,
            cache,
            synthesized: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        }
    }

    /// Return a reference to audio for `example_text`, synthesizing it if the
    /// cache does not hold it yet.
    ///
    /// On success the referenced file is present in the cache. A synthesizer
    /// or write failure is returned as-is; nothing is retried.
    #[instrument(skip(self), fields(synthesizer = %self.synthesizer.name()))]
    pub async fn ensure_audio(&self, note_id: &str, example_text: &str) -> Result<AudioAssetRef> {
        let derived = derive(note_id, example_text);

        if self.cache.contains(&derived.file_name) {
            debug!("Cache hit for {}", derived.file_name);
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            info!("Synthesizing audio for {}", derived.file_name);
            let audio = self.synthesizer.synthesize(example_text).await?;
            self.cache.write(&derived.file_name, &audio)?;
            self.synthesized.fetch_add(1, Ordering::Relaxed);
        }

        Ok(AudioAssetRef {
            file_path: self.cache.path(&derived.file_name),
            cache_key: derived.key,
            file_name: derived.file_name,
        })
    }

    /// Number of synthesizer calls made so far.
    pub fn synthesized(&self) -> usize {
        self.synthesized.load(Ordering::Relaxed)
    }

    /// Number of examples served from the cache so far.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSynthesizer;
    use super::*;
    use crate::audio::cache::{FsAudioCache, MemoryAudioCache};
    use crate::error::KartkaError;

    #[tokio::test]
    async fn test_miss_then_hit() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let cache = Arc::new(MemoryAudioCache::new());
        let orchestrator = SynthesisOrchestrator::new(synth.clone(), cache.clone());

        let first = orchestrator.ensure_audio("1", "To jest kot.").await.unwrap();
        let second = orchestrator.ensure_audio("1", "To jest kot.").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(synth.call_count(), 1);
        assert_eq!(orchestrator.synthesized(), 1);
        assert_eq!(orchestrator.cache_hits(), 1);
        assert_eq!(cache.read(&first.file_name).unwrap(), b"mp3:To jest kot.");
        assert_eq!(first.sound_tag(), format!("[sound:{}]", first.file_name));
    }

    #[tokio::test]
    async fn test_existing_file_is_never_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(FsAudioCache::new(dir.path()).unwrap());
        let name = derive("1", "To jest kot.").file_name;
        cache.write(&name, b"recorded earlier").unwrap();

        let synth = Arc::new(RecordingSynthesizer::default());
        let orchestrator = SynthesisOrchestrator::new(synth.clone(), cache.clone());
        let asset = orchestrator.ensure_audio("1", "To jest kot.").await.unwrap();

        assert_eq!(synth.call_count(), 0);
        assert_eq!(asset.file_path, dir.path().join(&name));
        assert_eq!(std::fs::read(&asset.file_path).unwrap(), b"recorded earlier");
    }

    #[tokio::test]
    async fn test_synthesis_failure_propagates_and_caches_nothing() {
        let synth = Arc::new(RecordingSynthesizer::failing_on("Zła fraza"));
        let cache = Arc::new(MemoryAudioCache::new());
        let orchestrator = SynthesisOrchestrator::new(synth, cache.clone());

        let err = orchestrator.ensure_audio("1", "Zła fraza").await.unwrap_err();
        assert!(matches!(err, KartkaError::Synthesis { ref text, .. } if text == "Zła fraza"));
        assert!(cache.is_empty());
        assert_eq!(orchestrator.synthesized(), 0);
    }
}
