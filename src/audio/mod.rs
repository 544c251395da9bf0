//! Example audio: cache naming, cache storage and cache-first synthesis.

mod cache;
mod key;
mod synthesis;

pub use cache::{AudioCache, CacheStats, FsAudioCache, MemoryAudioCache};
pub use key::{content_hash, derive, AudioKey, AUDIO_EXTENSION};
pub use synthesis::{AudioAssetRef, SynthesisOrchestrator};

#[cfg(test)]
pub(crate) use synthesis::testing;
