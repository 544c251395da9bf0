//! Doctor command - verify system requirements and configuration.

use crate::cli::{format_bytes, Output};
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Kartka Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Speech Synthesis").bold());
    let api_check = check_speech_key(settings);
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = vec![
        check_directory("Output directory", &settings.output_dir()),
        check_directory("Audio cache", &settings.audio_dir()),
    ];
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before building decks.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Kartka is ready to use.");
    }

    Ok(())
}

/// A missing key only matters when audio is enabled.
fn check_speech_key(settings: &Settings) -> CheckResult {
    let speech = &settings.speech;
    let env = speech.api_key_env();

    if !speech.enabled {
        return CheckResult::ok("Audio", "disabled in configuration");
    }

    match speech.resolve_api_key() {
        Some(key) => CheckResult::ok(
            &format!("{} key", speech.provider),
            &format!("configured ({})", mask(&key)),
        ),
        None => CheckResult::error(
            &format!("{} key", speech.provider),
            "not set",
            &format!("Set speech.api_key or export {}='...' (or build with --no-audio)", env),
        ),
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_directory(name: &str, dir: &Path) -> CheckResult {
    if !dir.exists() {
        return CheckResult::warning(
            name,
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first build",
        );
    }

    match tempfile::tempfile_in(dir) {
        Ok(_) => {
            let detail = std::fs::read_dir(dir)
                .map(|entries| {
                    let (count, bytes) = entries
                        .flatten()
                        .filter_map(|e| e.metadata().ok())
                        .filter(|m| m.is_file())
                        .fold((0usize, 0u64), |(c, b), m| (c + 1, b + m.len()));
                    format!("{} files, {}", count, format_bytes(bytes))
                })
                .unwrap_or_else(|_| "unreadable".to_string());
            CheckResult::ok(name, &format!("{} ({})", dir.display(), detail))
        }
        Err(e) => CheckResult::error(
            name,
            &format!("{} is not writable: {}", dir.display(), e),
            "Fix permissions or point the setting elsewhere",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: kartka config edit",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("AIzaSyExampleKey1234"), "AIza...1234");
    }

    #[test]
    fn test_check_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"abc").unwrap();
        let result = check_directory("Audio cache", dir.path());
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("1 files, 3 B"));

        let missing = check_directory("Audio cache", &dir.path().join("absent"));
        assert_eq!(missing.status, CheckStatus::Warning);
    }

    #[test]
    fn test_disabled_audio_needs_no_key() {
        let mut settings = Settings::default();
        settings.speech.enabled = false;
        assert_eq!(check_speech_key(&settings).status, CheckStatus::Ok);
    }
}
