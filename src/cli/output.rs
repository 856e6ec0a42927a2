//! CLI output formatting utilities.

use crate::rag::{Answer, Confidence};
use crate::retrieval::Passage;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an answer with its confidence and sources.
    pub fn answer(speaker: &str, answer: &Answer) {
        let result = &answer.result;
        let confidence = match result.confidence {
            Confidence::High => style(result.confidence.to_string()).green(),
            Confidence::Medium => style(result.confidence.to_string()).yellow(),
            Confidence::Low => style(result.confidence.to_string()).red(),
        };

        println!("\n{} {}\n", style(speaker).cyan().bold(), result.answer);
        println!(
            "  {} confidence: {}, language: {}{}",
            style("-").dim(),
            confidence,
            result.language,
            if result.is_follow_up { ", follow-up" } else { "" }
        );

        if !result.sources.is_empty() {
            println!("  {} sources:", style("-").dim());
            for source in &result.sources {
                println!("    {} {}", style("*").cyan(), source);
            }
        }
        println!();
    }

    /// Print a retrieved passage.
    pub fn passage(passage: &Passage) {
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(&passage.source_title).bold(),
            passage.score
        );
        println!("   {}", content_preview(&passage.text, 200));
        if let Some(source) = &passage.source {
            println!("   {}", style(source).dim());
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Single-line preview cut to `max_chars` chars.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &content[..end]),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("line one\nline two", 100), "line one line two");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }
}
