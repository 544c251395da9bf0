//! Deck records and the packaging sink.
//!
//! Notes are assembled into a [`DeckAccumulator`] during a run and handed
//! to a [`DeckWriter`] exactly once, after every entry succeeded.

mod anki;
mod assembler;
mod model;

pub use anki::AnkiPackageWriter;
pub use assembler::{IdRegistry, NormalizedFields, NoteAssembler};
pub use model::{CardTemplate, ModelKind, NoteModel};

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

/// A deck-ready note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    /// Unique note id (the CID field).
    pub id: String,
    pub source_field: String,
    pub target_field: String,
    /// Rendered `<ul>` of examples.
    pub examples_field: String,
    /// Concatenated `[sound:...]` references, empty without audio.
    pub audio_field: String,
}

/// Notes and media gathered during a run.
#[derive(Debug, Default, Clone)]
pub struct DeckAccumulator {
    notes: Vec<NoteRecord>,
    media: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl DeckAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note and the media it references. Media already referenced
    /// by an earlier note is listed once.
    pub fn push(&mut self, note: NoteRecord, media: impl IntoIterator<Item = PathBuf>) {
        self.notes.push(note);
        for path in media {
            if self.seen.insert(path.clone()) {
                self.media.push(path);
            }
        }
    }

    pub fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    pub fn media(&self) -> &[PathBuf] {
        &self.media
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Finish accumulation into a deck.
    pub fn into_deck(self, id: i64, name: &str, model: NoteModel, package_name: &str) -> Deck {
        Deck {
            id,
            name: name.to_string(),
            model,
            package_name: package_name.to_string(),
            notes: self.notes,
            media: self.media,
        }
    }
}

/// Everything a writer needs to produce a package.
#[derive(Debug, Clone)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub model: NoteModel,
    /// File name of the package to produce.
    pub package_name: String,
    pub notes: Vec<NoteRecord>,
    pub media: Vec<PathBuf>,
}

/// Sink that turns a deck into a package.
#[async_trait]
pub trait DeckWriter: Send + Sync {
    /// Write the deck and return the package location.
    async fn write(&self, deck: &Deck) -> Result<PathBuf>;
}

/// Writer that keeps decks in memory.
///
/// Useful for testing.
#[derive(Default)]
pub struct MemoryDeckWriter {
    decks: Mutex<Vec<Deck>>,
}

impl MemoryDeckWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decks written so far.
    pub fn decks(&self) -> Vec<Deck> {
        self.decks.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeckWriter for MemoryDeckWriter {
    async fn write(&self, deck: &Deck) -> Result<PathBuf> {
        self.decks.lock().unwrap().push(deck.clone());
        Ok(PathBuf::from(&deck.package_name))
    }
}
