//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    let config_path = Settings::default_config_path();

    match action {
        ConfigAction::Show => {
            let origin = if config_path.exists() {
                format!("# Loaded from {}", config_path.display())
            } else {
                "# No config file, showing defaults".to_string()
            };
            let body = toml::to_string_pretty(&settings).context("Failed to serialize config")?;
            println!("{}\n\n{}", origin, body);
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Wrote default config to {}", config_path.display()));
            }

            let editor = std::env::var("VISUAL")
                .or_else(|_| std::env::var("EDITOR"))
                .unwrap_or_else(|_| "vi".to_string());

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status()
                .with_context(|| format!("Failed to launch {}", editor))?;

            if !status.success() {
                Output::warning(&format!("{} exited with {}", editor, status));
                return Ok(());
            }

            verify(&config_path)?;
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Reload an edited file so syntax errors surface now rather than on the
/// next build.
fn verify(path: &Path) -> Result<()> {
    match Settings::load_from(Some(&path.to_path_buf())) {
        Ok(settings) => {
            Output::success("Config is valid.");
            Output::kv("Deck", &settings.deck.deck_name);
            Output::kv(
                "Audio",
                &if settings.speech.enabled {
                    settings.speech.provider.to_string()
                } else {
                    "disabled".to_string()
                },
            );
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{} is not valid: {}", path.display(), e));
            Err(e.into())
        }
    }
}
