//! Audio cache backends.
//!
//! The cache is keyed by file name. Entries are only ever added; nothing in
//! Kartka deletes or rewrites a cached file.

use crate::error::{KartkaError, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Storage for synthesized audio.
pub trait AudioCache: Send + Sync {
    /// Check whether audio for `file_name` is already cached.
    fn contains(&self, file_name: &str) -> bool;

    /// Read cached audio.
    fn read(&self, file_name: &str) -> Result<Vec<u8>>;

    /// Store audio under `file_name`.
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<()>;

    /// Location of a cached file, as referenced from the deck's media list.
    fn path(&self, file_name: &str) -> PathBuf;
}

/// Directory-backed cache: one flat directory of audio files.
pub struct FsAudioCache {
    dir: PathBuf,
}

impl FsAudioCache {
    /// Open (creating if needed) a cache directory.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| KartkaError::io(dir, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a cache entry, which must stay directly inside the directory.
    fn entry(&self, file_name: &str) -> Result<PathBuf> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(file_name)),
            _ => Err(KartkaError::io(
                file_name,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "cache entries must be plain file names",
                ),
            )),
        }
    }

    /// Summarize the cached files.
    pub fn stats(&self) -> Result<CacheStats> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| KartkaError::io(&self.dir, e))?;

        let mut stats = CacheStats::default();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(super::AUDIO_EXTENSION) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                stats.files += 1;
                stats.total_bytes += meta.len();
            }
        }
        Ok(stats)
    }
}

impl AudioCache for FsAudioCache {
    fn contains(&self, file_name: &str) -> bool {
        self.entry(file_name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self.entry(file_name)?;
        std::fs::read(&path).map_err(|e| KartkaError::io(path, e))
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry(file_name)?;

        // Write through a temp file so an interrupted run never leaves a
        // truncated file that later counts as a hit.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| KartkaError::io(&self.dir, e))?;
        tmp.write_all(bytes).map_err(|e| KartkaError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| KartkaError::io(&path, e.error))?;

        debug!("Cached {} bytes at {:?}", bytes.len(), path);
        Ok(())
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Cache directory summary.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub files: usize,
    pub total_bytes: u64,
}

/// In-memory cache.
///
/// Useful for testing.
pub struct MemoryAudioCache {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryAudioCache {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryAudioCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCache for MemoryAudioCache {
    fn contains(&self, file_name: &str) -> bool {
        self.files.read().unwrap().contains_key(file_name)
    }

    fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .unwrap()
            .get(file_name)
            .cloned()
            .ok_or_else(|| {
                KartkaError::io(
                    file_name,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "not cached"),
                )
            })
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
        self.files
            .write()
            .unwrap()
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_cache_write_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(&dir.path().join("audio")).unwrap();

        assert!(!cache.contains("1_abc.mp3"));
        cache.write("1_abc.mp3", b"ID3 audio").unwrap();
        assert!(cache.contains("1_abc.mp3"));
        assert_eq!(cache.read("1_abc.mp3").unwrap(), b"ID3 audio");
        assert_eq!(cache.path("1_abc.mp3"), dir.path().join("audio").join("1_abc.mp3"));
    }

    #[test]
    fn test_fs_cache_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(dir.path()).unwrap();
        cache.write("a.mp3", b"1").unwrap();
        cache.write("b.mp3", b"22").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 2);

        let stats = cache.stats().unwrap();
        assert_eq!(stats, CacheStats { files: 2, total_bytes: 3 });
    }

    #[test]
    fn test_fs_cache_read_missing_has_path() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(dir.path()).unwrap();
        let err = cache.read("missing.mp3").unwrap_err();
        assert!(err.to_string().contains("missing.mp3"));
    }

    #[test]
    fn test_fs_cache_refuses_names_outside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(&dir.path().join("audio")).unwrap();
        let outside = dir.path().join("elsewhere").join("evil_1.mp3");

        for name in ["../up_1.mp3", outside.to_str().unwrap(), "sub/dir.mp3", "..", ""] {
            assert!(cache.write(name, b"x").is_err(), "name {name:?}");
            assert!(!cache.contains(name));
            assert!(cache.read(name).is_err());
        }
        assert!(!dir.path().join("up_1.mp3").exists());
        assert!(!outside.exists());
        assert_eq!(cache.stats().unwrap().files, 0);
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryAudioCache::new();
        assert!(cache.is_empty());
        cache.write("x.mp3", b"bytes").unwrap();
        assert!(cache.contains("x.mp3"));
        assert_eq!(cache.read("x.mp3").unwrap(), b"bytes");
        assert!(cache.read("y.mp3").is_err());
        assert_eq!(cache.len(), 1);
    }
}
