//! Cache command implementation.

use crate::audio::FsAudioCache;
use crate::cli::{format_bytes, CacheAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the cache command.
pub fn run_cache(action: &CacheAction, settings: &Settings) -> Result<()> {
    match action {
        CacheAction::Stats => {
            let dir = settings.audio_dir();
            if !dir.exists() {
                Output::info(&format!("Audio cache {} is empty", dir.display()));
                return Ok(());
            }

            let cache = FsAudioCache::new(&dir)?;
            let stats = cache.stats()?;

            Output::header("Audio cache");
            Output::kv("Directory", &dir.display().to_string());
            Output::kv("Files", &stats.files.to_string());
            Output::kv("Size", &format_bytes(stats.total_bytes));
        }

        CacheAction::Path => {
            println!("{}", settings.audio_dir().display());
        }
    }

    Ok(())
}
