//! Pipeline driver for Kartka.
//!
//! Takes entries in input order through validation, escaping, audio and
//! note assembly, then hands the finished deck to the writer. Any error
//! aborts the run before the writer is called.

use crate::audio::{content_hash, AudioAssetRef, FsAudioCache, SynthesisOrchestrator};
use crate::config::{InputSettings, Settings};
use crate::deck::{
    AnkiPackageWriter, DeckAccumulator, DeckWriter, NormalizedFields, NoteAssembler, NoteModel,
};
use crate::error::{KartkaError, Result};
use crate::markup::{escape_html, render_examples};
use crate::record::{validate, Entry};
use crate::speech::create_synthesizer;
use indicatif::ProgressBar;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Identity of the deck a pipeline produces.
#[derive(Debug, Clone)]
pub struct DeckSpec {
    pub id: i64,
    pub name: String,
    pub model: NoteModel,
    pub package_name: String,
}

impl DeckSpec {
    /// The vocabulary deck described by settings.
    pub fn vocabulary(settings: &Settings) -> Self {
        Self {
            id: settings.deck.deck_id,
            name: settings.deck.deck_name.clone(),
            model: NoteModel::vocabulary(&settings.deck),
            package_name: settings.deck.package_name.clone(),
        }
    }

    /// The movapp phrasebook deck described by settings.
    pub fn phrasebook(settings: &Settings) -> Self {
        Self {
            id: settings.movapp.deck_id,
            name: settings.movapp.deck_name.clone(),
            model: NoteModel::phrasebook(&settings.movapp, &settings.deck),
            package_name: settings.movapp.package_name.clone(),
        }
    }
}

/// The batch converter.
pub struct Pipeline {
    fields: InputSettings,
    deck: DeckSpec,
    synthesis: Option<SynthesisOrchestrator>,
    writer: Arc<dyn DeckWriter>,
    progress: Option<ProgressBar>,
}

impl Pipeline {
    /// Create a pipeline without audio generation.
    pub fn new(fields: InputSettings, deck: DeckSpec, writer: Arc<dyn DeckWriter>) -> Self {
        Self {
            fields,
            deck,
            synthesis: None,
            writer,
            progress: None,
        }
    }

    /// Generate example audio through `orchestrator`.
    pub fn with_synthesis(mut self, orchestrator: SynthesisOrchestrator) -> Self {
        self.synthesis = Some(orchestrator);
        self
    }

    /// Report per-entry progress on a bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Wire the vocabulary pipeline from settings: package writer into the
    /// output directory and, when `audio` is set, the configured synthesizer
    /// behind the audio cache directory.
    pub fn from_settings(settings: &Settings, audio: bool) -> Result<Self> {
        let writer = Arc::new(AnkiPackageWriter::new(&settings.output_dir()));
        let pipeline = Self::new(settings.input.clone(), DeckSpec::vocabulary(settings), writer);

        if !audio {
            info!("Audio generation disabled");
            return Ok(pipeline);
        }

        let synthesizer = create_synthesizer(&settings.speech)?;
        let cache = Arc::new(FsAudioCache::new(&settings.audio_dir())?);
        info!(
            "Using {} speech synthesis, cache at {:?}",
            settings.speech.provider,
            cache.dir()
        );

        Ok(pipeline.with_synthesis(SynthesisOrchestrator::new(synthesizer, cache)))
    }

    pub fn audio_enabled(&self) -> bool {
        self.synthesis.is_some()
    }

    /// Validate raw entries and check id uniqueness without synthesizing or
    /// writing anything. Returns the number of notes the input would yield.
    #[instrument(skip_all, fields(entries = raw.len()))]
    pub fn check(&self, raw: &[Value]) -> Result<usize> {
        let mut assembler = NoteAssembler::new();
        for value in raw {
            let entry = validate(value, &self.fields)?;
            assembler.assemble(normalize(&entry), &[])?;
        }
        Ok(assembler.registry().len())
    }

    /// Run the full conversion over raw JSON entries.
    #[instrument(skip_all, fields(entries = raw.len()))]
    pub async fn run(&self, raw: &[Value]) -> Result<BuildReport> {
        let entries = raw.iter().map(|value| validate(value, &self.fields));
        self.run_inner(raw.len(), entries).await
    }

    /// Run the full conversion over already-typed entries.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn run_entries(&self, entries: Vec<Entry>) -> Result<BuildReport> {
        let total = entries.len();
        self.run_inner(total, entries.into_iter().map(Ok)).await
    }

    async fn run_inner(
        &self,
        total: usize,
        entries: impl Iterator<Item = Result<Entry>>,
    ) -> Result<BuildReport> {
        let (synthesized_before, hits_before) = self.synthesis_counts();

        if let Some(pb) = &self.progress {
            pb.set_length(total as u64);
        }

        let mut assembler = NoteAssembler::new();
        let mut accumulator = DeckAccumulator::new();

        for entry in entries {
            let entry = entry?;
            self.process_entry(&mut assembler, &mut accumulator, entry).await?;
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        let notes = accumulator.len();
        let media_files = accumulator.media().len();
        let deck = accumulator.into_deck(
            self.deck.id,
            &self.deck.name,
            self.deck.model.clone(),
            &self.deck.package_name,
        );

        info!("Writing deck '{}' with {} notes", deck.name, notes);
        let package = self.writer.write(&deck).await?;

        let (synthesized_after, hits_after) = self.synthesis_counts();
        Ok(BuildReport {
            notes,
            media_files,
            synthesized: synthesized_after - synthesized_before,
            cache_hits: hits_after - hits_before,
            package,
        })
    }

    #[instrument(skip(self, assembler, accumulator, entry), fields(id = %entry.id))]
    async fn process_entry(
        &self,
        assembler: &mut NoteAssembler,
        accumulator: &mut DeckAccumulator,
        entry: Entry,
    ) -> Result<()> {
        // Fail on a repeated id before spending synthesizer calls on it.
        assembler.check_unique(&entry.id)?;

        let fields = normalize(&entry);

        let mut audio = Vec::with_capacity(entry.examples.len() + entry.recordings.len());
        for recording in &entry.recordings {
            audio.push(recording_ref(recording)?);
        }
        if let Some(synthesis) = &self.synthesis {
            for example in &entry.examples {
                audio.push(synthesis.ensure_audio(&entry.id, example).await?);
            }
        }

        let note = assembler.assemble(fields, &audio)?;
        debug!("Assembled note {} with {} audio files", note.id, audio.len());

        accumulator.push(note, audio.into_iter().map(|a| a.file_path));
        Ok(())
    }

    fn synthesis_counts(&self) -> (usize, usize) {
        self.synthesis
            .as_ref()
            .map(|s| (s.synthesized(), s.cache_hits()))
            .unwrap_or((0, 0))
    }
}

fn normalize(entry: &Entry) -> NormalizedFields {
    NormalizedFields {
        id: entry.id.clone(),
        source_field: escape_html(&entry.source_text),
        target_field: escape_html(&entry.target_text),
        examples_field: render_examples(&entry.examples),
    }
}

/// Reference a prerecorded file, which must exist.
fn recording_ref(path: &Path) -> Result<AudioAssetRef> {
    if !path.is_file() {
        return Err(KartkaError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "recording not found"),
        ));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| KartkaError::Package(format!("Invalid recording path: {:?}", path)))?
        .to_string();

    Ok(AudioAssetRef {
        cache_key: content_hash(&file_name),
        file_name,
        file_path: path.to_path_buf(),
    })
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Notes written to the deck.
    pub notes: usize,
    /// Distinct media files bundled with the deck.
    pub media_files: usize,
    /// Synthesizer calls made during the run.
    pub synthesized: usize,
    /// Examples served from the audio cache.
    pub cache_hits: usize,
    /// Location of the written package.
    pub package: PathBuf,
}
