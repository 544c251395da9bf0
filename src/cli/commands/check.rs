//! Check command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::deck::MemoryDeckWriter;
use crate::pipeline::{DeckSpec, Pipeline};
use crate::record::load_entries;
use anyhow::Result;
use std::sync::Arc;

/// Validate an input file without synthesizing or writing anything.
pub fn run_check(input: &str, settings: &Settings) -> Result<()> {
    let input_path = Settings::expand_path(input);
    let raw = load_entries(&input_path)?;

    let pipeline = Pipeline::new(
        settings.input.clone(),
        DeckSpec::vocabulary(settings),
        Arc::new(MemoryDeckWriter::new()),
    );

    match pipeline.check(&raw) {
        Ok(notes) => {
            Output::success(&format!(
                "{} is valid: {} notes",
                input_path.display(),
                notes
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}
