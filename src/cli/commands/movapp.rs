//! Movapp command implementation.

use super::build::print_report;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::deck::AnkiPackageWriter;
use crate::movapp::load_phrasebook;
use crate::pipeline::{DeckSpec, Pipeline};
use anyhow::Result;
use std::sync::Arc;

/// Build the phrasebook deck from a movapp-data checkout.
pub async fn run_movapp(
    data_dir: Option<String>,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    let data_dir = data_dir
        .map(|d| Settings::expand_path(&d))
        .unwrap_or_else(|| settings.movapp_dir());
    let output_dir = output
        .map(|d| Settings::expand_path(&d))
        .unwrap_or_else(|| settings.output_dir());

    if let Err(e) = preflight::check(Operation::Build, &settings.speech, &output_dir) {
        Output::error(&format!("{}", e));
        Output::info("Run 'kartka doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let entries = load_phrasebook(&data_dir, &settings.movapp)?;
    Output::info(&format!(
        "Loaded {} phrases from {}",
        entries.len(),
        data_dir.display()
    ));

    let pipeline = Pipeline::new(
        settings.input.clone(),
        DeckSpec::phrasebook(&settings),
        Arc::new(AnkiPackageWriter::new(&output_dir)),
    )
    .with_progress(Output::progress_bar("Building phrases"));

    match pipeline.run_entries(entries).await {
        Ok(report) => {
            print_report(&report, false);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Build failed, no package written: {}", e));
            Err(e.into())
        }
    }
}
