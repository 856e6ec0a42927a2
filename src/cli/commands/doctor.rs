//! Doctor command - verify API keys and configuration.

use crate::cli::Output;
use crate::config::{RetrievalProvider, Settings};
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
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Askr Doctor");
    println!();
    println!("Checking API keys and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Keys").bold());
    let mut key_checks = vec![check_api_key(
        "OPENAI_API_KEY",
        std::env::var("OPENAI_API_KEY").ok().as_deref(),
        "sk-",
    )];
    if settings.retrieval.provider == RetrievalProvider::Pinecone {
        key_checks.push(check_api_key(
            "PINECONE_API_KEY",
            std::env::var("PINECONE_API_KEY").ok().as_deref(),
            "pcsk_",
        ));
    }
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Knowledge Base").bold());
    let index_check = check_index(settings);
    index_check.print();
    checks.push(index_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_settings(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Askr.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Askr is ready to use.");
    }

    Ok(())
}

/// Check an API key value taken from the environment.
fn check_api_key(name: &str, value: Option<&str>, expected_prefix: &str) -> CheckResult {
    let hint = format!("Set with: export {}='{}...'", name, expected_prefix);
    match value {
        None => CheckResult::error(name, "not set", &hint),
        Some("") => CheckResult::error(name, "empty", &hint),
        Some(key) if key.starts_with(expected_prefix) && key.chars().count() > 20 => {
            CheckResult::ok(name, &format!("configured ({})", mask_key(key)))
        }
        Some(_) => CheckResult::warning(
            name,
            "set but format looks unusual",
            &format!("Expected format: {}...", expected_prefix),
        ),
    }
}

/// Show only the first 7 and last 4 chars of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check that the configured index is reachable in principle.
fn check_index(settings: &Settings) -> CheckResult {
    match settings.retrieval.provider {
        RetrievalProvider::Pinecone if settings.retrieval.pinecone_host.is_empty() => {
            CheckResult::error(
                "Pinecone index",
                "no host configured",
                "Set retrieval.pinecone_host in your config file",
            )
        }
        RetrievalProvider::Pinecone => {
            CheckResult::ok("Pinecone index", &settings.retrieval.pinecone_host)
        }
        RetrievalProvider::Memory => {
            let path = settings.snapshot_path();
            if path.exists() {
                CheckResult::ok("Snapshot", &format!("{}", path.display()))
            } else {
                CheckResult::error(
                    "Snapshot",
                    &format!("{} not found", path.display()),
                    "Set retrieval.snapshot_path to a JSON export of the knowledge base",
                )
            }
        }
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: askr config init",
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Settings",
            &format!(
                "threshold {:.2}, {} cached answers, {} pairs per session",
                settings.cache.similarity_threshold,
                settings.cache.max_entries,
                settings.memory.max_history
            ),
        ),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the value in your config file"),
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
    fn test_check_api_key() {
        assert_eq!(check_api_key("K", None, "sk-").status, CheckStatus::Error);
        assert_eq!(check_api_key("K", Some(""), "sk-").status, CheckStatus::Error);
        assert_eq!(
            check_api_key("K", Some("not-a-real-key"), "sk-").status,
            CheckStatus::Warning
        );

        let result = check_api_key("K", Some("sk-abcdefghijklmnopqrstuvwxyz"), "sk-");
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "configured (sk-abcd...wxyz)");
    }

    #[test]
    fn test_memory_snapshot_missing_is_error() {
        let mut settings = Settings::default();
        settings.retrieval.provider = RetrievalProvider::Memory;
        settings.retrieval.snapshot_path = "/nonexistent/askr/knowledge.json".to_string();
        assert_eq!(check_index(&settings).status, CheckStatus::Error);
    }

    #[test]
    fn test_pinecone_without_host_is_error() {
        let settings = Settings::default();
        assert_eq!(check_index(&settings).status, CheckStatus::Error);
    }
}
