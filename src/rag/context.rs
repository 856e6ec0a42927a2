//! Prompt context built from retrieved passages.

use crate::retrieval::Passage;

/// Chars of passage text shown to the model.
const SNIPPET_CHARS: usize = 200;

/// Format passages for the answer prompt, best first.
pub fn format_passages(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return "No relevant context found.".to_string();
    }

    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            let snippet: String = passage.text.chars().take(SNIPPET_CHARS).collect();
            format!(
                "Context {} (Relevance: {:.3}):\nVideo Title: {}\nContent Snippet: {}...",
                i + 1,
                passage.score,
                passage.source_title,
                snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prefix passage context with recent conversation. Returns `context` unchanged
/// when there is no conversation.
pub fn with_conversation(conversation: &str, context: &str) -> String {
    if conversation.is_empty() {
        return context.to_string();
    }
    format!(
        "Recent conversation:\n{}\n\nRelevant information:\n{}",
        conversation, context
    )
}

/// Titles of the passages' source videos, in passage order.
pub fn source_titles(passages: &[Passage]) -> Vec<String> {
    passages.iter().map(|p| p.source_title.clone()).collect()
}
