//! Kartka CLI entry point.

use anyhow::Result;
use clap::Parser;
use kartka::cli::{commands, Cli, Commands};
use kartka::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = cli.log_level(&settings.general.log_level);

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kartka={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Build {
            input,
            output,
            no_audio,
        } => {
            commands::run_build(input, output.clone(), *no_audio, settings).await?;
        }

        Commands::Check { input } => {
            commands::run_check(input, &settings)?;
        }

        Commands::Movapp { data_dir, output } => {
            commands::run_movapp(data_dir.clone(), output.clone(), settings).await?;
        }

        Commands::Cache { action } => {
            commands::run_cache(action, &settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
