//! Kartka - vocabulary JSON to flashcard decks
//!
//! A batch converter that turns word pairs, translations and example
//! sentences into an Anki deck package, optionally with synthesized audio
//! for every example.
//!
//! "Kartka" is Polish for a sheet of paper, or a card.
//!
//! # Overview
//!
//! A run reads a JSON array of entries and, for each entry in order:
//! - validates its shape (`record`)
//! - escapes its text and renders its examples (`markup`)
//! - names, looks up and if needed synthesizes example audio (`audio`, `speech`)
//! - assembles a note, rejecting repeated ids (`deck`)
//!
//! Only when every entry succeeded is the deck handed to a writer. Any error
//! aborts the run and no package is written. Synthesized audio is cached on
//! disk under content-derived names, so re-running never repeats a
//! synthesizer call.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `record` - Input entries and validation
//! - `markup` - HTML escaping and example rendering
//! - `audio` - Audio cache keys, cache storage and cache-first synthesis
//! - `speech` - Text-to-speech backends
//! - `deck` - Notes, note models and package writers
//! - `movapp` - Movapp phrasebook import
//! - `pipeline` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use kartka::config::Settings;
//! use kartka::pipeline::Pipeline;
//! use kartka::record::load_entries;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::from_settings(&settings, true)?;
//!
//!     let entries = load_entries(std::path::Path::new("notes.json"))?;
//!     let report = pipeline.run(&entries).await?;
//!     println!("Wrote {} notes to {:?}", report.notes, report.package);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod deck;
pub mod error;
pub mod markup;
pub mod movapp;
pub mod openai;
pub mod pipeline;
pub mod record;
pub mod speech;

pub use error::{KartkaError, Result};
