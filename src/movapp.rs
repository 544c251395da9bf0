//! Movapp phrasebook import.
//!
//! Reads the uk-pl dictionary from a movapp-data checkout and turns each
//! phrase into an [`Entry`] carrying its prerecorded Polish pronunciation.
//! Nothing is synthesized.

use crate::config::MovappSettings;
use crate::error::{KartkaError, Result};
use crate::record::Entry;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct Dictionary {
    categories: Vec<Category>,
    phrases: HashMap<String, Phrase>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    name: Option<serde_json::Value>,
    phrases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Phrase {
    source: Translation,
    main: MainTranslation,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    translation: String,
}

#[derive(Debug, Deserialize)]
struct MainTranslation {
    translation: String,
    sound_url: String,
}

/// Load phrasebook entries in category order.
///
/// Entries use the Polish text as source and the Ukrainian text as target.
/// A phrase listed in several categories appears several times; the
/// pipeline rejects the repeat as a duplicate id.
#[instrument(skip(settings))]
pub fn load_phrasebook(data_dir: &Path, settings: &MovappSettings) -> Result<Vec<Entry>> {
    let path = data_dir.join(&settings.dictionary_file);
    let content = std::fs::read_to_string(&path).map_err(|e| KartkaError::io(&path, e))?;
    let dictionary: Dictionary = serde_json::from_str(&content)?;

    let sounds_dir = data_dir.join(&settings.sounds_dir);
    let mut entries = Vec::new();

    for category in &dictionary.categories {
        debug!("Category {:?} with {} phrases", category.name, category.phrases.len());

        for phrase_id in &category.phrases {
            let phrase = dictionary.phrases.get(phrase_id).ok_or_else(|| {
                KartkaError::validation(
                    "phrases",
                    format!("Phrase {} is listed in a category but not defined", phrase_id),
                )
            })?;

            if let Some(image) = phrase.image_url.as_deref().filter(|u| !u.is_empty()) {
                debug!("Phrase {} has image {}", phrase_id, image);
            }

            let mut entry = Entry::new(
                phrase_id.clone(),
                phrase.main.translation.clone(),
                phrase.source.translation.clone(),
                Vec::new(),
            );
            entry.recordings.push(sound_path(
                &sounds_dir,
                &phrase.main.sound_url,
                &settings.sound_url_prefix,
            ));
            entries.push(entry);
        }
    }

    info!("Loaded {} phrases from {:?}", entries.len(), path);
    Ok(entries)
}

/// Resolve a sound URL to a file under the local sounds directory.
fn sound_path(sounds_dir: &Path, sound_url: &str, prefix: &str) -> PathBuf {
    let relative = sound_url.strip_prefix(prefix).unwrap_or(sound_url);
    sounds_dir.join(relative)
}
