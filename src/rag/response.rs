//! Answer types and structured-reply parsing.

use crate::retrieval::Passage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How well the retrieved context covers the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Lenient parse of a model-supplied label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(label)
    }
}

/// The answer shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: Confidence,
    pub sources_used: usize,
    /// Language of the answer.
    pub language: String,
    /// Titles of the videos the passages came from.
    pub sources: Vec<String>,
    /// Unparsed model output.
    pub raw_response: String,
    pub is_follow_up: bool,
}

impl AnswerResult {
    /// Low-confidence answer for a failed pipeline.
    pub fn error(message: impl fmt::Display, is_follow_up: bool) -> Self {
        let answer = format!("Error generating answer: {}", message);
        Self {
            raw_response: answer.clone(),
            answer,
            confidence: Confidence::Low,
            sources_used: 0,
            language: "English".to_string(),
            sources: Vec::new(),
            is_follow_up,
        }
    }
}

/// A complete answer with the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub result: AnswerResult,
    pub passages: Vec<Passage>,
    /// Detected language of the question.
    pub language: String,
}

/// Fields recovered from a JSON model reply. Missing fields are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredReply {
    pub answer: Option<String>,
    pub confidence: Option<Confidence>,
    pub sources_used: Option<usize>,
    pub language: Option<String>,
}

/// Parse a model reply that should hold a JSON object.
///
/// Accepts bare JSON, JSON inside a ``` fence, or JSON surrounded by prose.
/// Returns `None` when no object can be parsed.
pub fn parse_structured(raw: &str) -> Option<StructuredReply> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;
    let object = value.as_object()?;

    let text = |key: &str| match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    };

    let sources_used = match object.get("sources_used") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    Some(StructuredReply {
        answer: text("answer"),
        confidence: text("confidence").and_then(|c| Confidence::from_label(&c)),
        sources_used,
        language: text("language"),
    })
}
