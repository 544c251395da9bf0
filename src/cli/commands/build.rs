//! Build command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{BuildReport, Pipeline};
use crate::record::load_entries;
use anyhow::Result;

/// Run the build command.
pub async fn run_build(
    input: &str,
    output: Option<String>,
    no_audio: bool,
    mut settings: Settings,
) -> Result<()> {
    let audio = settings.speech.enabled && !no_audio;
    let operation = if audio {
        Operation::BuildWithAudio
    } else {
        Operation::Build
    };

    if let Some(dir) = output {
        settings.general.output_dir = dir;
    }

    if let Err(e) = preflight::check(operation, &settings.speech, &settings.output_dir()) {
        Output::error(&format!("{}", e));
        Output::info("Run 'kartka doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let input_path = Settings::expand_path(input);
    let raw = load_entries(&input_path)?;
    Output::info(&format!("Loaded {} entries from {}", raw.len(), input_path.display()));

    let pipeline = Pipeline::from_settings(&settings, audio)?
        .with_progress(Output::progress_bar("Building notes"));

    match pipeline.run(&raw).await {
        Ok(report) => {
            print_report(&report, pipeline.audio_enabled());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Build failed, no package written: {}", e));
            Err(e.into())
        }
    }
}

pub(super) fn print_report(report: &BuildReport, audio: bool) {
    Output::success(&format!("Wrote {}", report.package.display()));
    Output::kv("Notes", &report.notes.to_string());
    Output::kv("Media files", &report.media_files.to_string());
    if audio {
        Output::kv("Synthesized", &report.synthesized.to_string());
        Output::kv("Cache hits", &report.cache_hits.to_string());
    }
}
