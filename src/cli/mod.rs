//! CLI module for Kartka.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_bytes, Output};

use clap::{Parser, Subcommand};

/// Kartka - vocabulary JSON to flashcard decks
///
/// Converts word pairs, translations and example sentences into an Anki deck,
/// with synthesized audio for every example.
#[derive(Parser, Debug)]
#[command(name = "kartka")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "KARTKA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level for the run: `-v` flags override the configured level.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a deck package from a vocabulary JSON file
    Build {
        /// Path to the JSON array of entries
        input: String,

        /// Output directory (defaults to general.output_dir)
        #[arg(short, long)]
        output: Option<String>,

        /// Skip example audio generation
        #[arg(long)]
        no_audio: bool,
    },

    /// Validate a vocabulary JSON file without synthesizing or writing anything
    Check {
        /// Path to the JSON array of entries
        input: String,
    },

    /// Build the phrasebook deck from a movapp-data checkout
    Movapp {
        /// Path to the movapp-data `data` directory (defaults to movapp.data_dir)
        #[arg(short, long)]
        data_dir: Option<String>,

        /// Output directory (defaults to general.output_dir)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect the audio cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the number and total size of cached audio files
    Stats,

    /// Show the audio cache directory
    Path,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "kartka",
            "-vv",
            "build",
            "notes.json",
            "--no-audio",
            "-o",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Build { input, output, no_audio } => {
                assert_eq!(input, "notes.json");
                assert_eq!(output.as_deref(), Some("out"));
                assert!(no_audio);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_cache_stats() {
        let cli = Cli::try_parse_from(["kartka", "cache", "stats"]).unwrap();
        assert!(matches!(cli.command, Commands::Cache { action: CacheAction::Stats }));
    }

    #[test]
    fn test_log_level_defaults_to_configured() {
        let quiet = Cli::try_parse_from(["kartka", "doctor"]).unwrap();
        assert_eq!(quiet.log_level("error"), "error");

        let verbose = Cli::try_parse_from(["kartka", "-v", "doctor"]).unwrap();
        assert_eq!(verbose.log_level("error"), "info");
    }
}
