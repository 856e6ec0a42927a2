//! Per-session conversation memory.
//!
//! Keeps the last few question/answer pairs of every session so follow-up
//! questions can be answered with the earlier exchange in view.

mod followup;

pub use followup::{FollowupDetector, HeuristicFollowupDetector};

use crate::config::MemorySettings;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Answers listed by [`ConversationMemory::get_context`] are shortened to this many chars.
const CONTEXT_ANSWER_CHARS: usize = 100;

/// One question and its (possibly truncated) answer.
#[derive(Debug, Clone, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded history of one session, oldest first.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub session_id: String,
    pub history: VecDeque<QaPair>,
}

/// Summary of one pair for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaSummary {
    pub question: String,
    pub answer: String,
}

/// Snapshot of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationContext {
    pub qa_pairs: Vec<QaSummary>,
    pub count: usize,
    /// The most recent question, if any.
    pub last_topic: Option<String>,
}

/// Memory statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub active_sessions: usize,
    pub total_qa_pairs: usize,
    pub max_history_per_session: usize,
}

/// Conversation memory shared across sessions.
pub struct ConversationMemory {
    sessions: RwLock<HashMap<String, ConversationSession>>,
    max_history: usize,
    max_answer_chars: usize,
    detector: Arc<dyn FollowupDetector>,
}

impl ConversationMemory {
    /// Create a memory keeping `max_history` pairs per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
            max_answer_chars: 300,
            detector: Arc::new(HeuristicFollowupDetector),
        }
    }

    /// Create a memory from configuration.
    pub fn from_settings(settings: &MemorySettings) -> Self {
        Self::new(settings.max_history).with_max_answer_chars(settings.max_answer_chars)
    }

    /// Set how many chars of each answer are kept.
    pub fn with_max_answer_chars(mut self, max_answer_chars: usize) -> Self {
        self.max_answer_chars = max_answer_chars;
        self
    }

    /// Replace the follow-up detection strategy.
    pub fn with_detector(mut self, detector: Arc<dyn FollowupDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Append a pair to the session, dropping the oldest beyond the bound.
    pub fn add_qa_pair(&self, question: &str, answer: &str, session_id: &str) {
        let pair = QaPair {
            question: question.to_string(),
            answer: truncate_chars(answer, self.max_answer_chars),
            timestamp: Utc::now(),
        };

        let mut sessions = self.sessions.write();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationSession {
                session_id: session_id.to_string(),
                history: VecDeque::with_capacity(self.max_history + 1),
            });

        session.history.push_back(pair);
        while session.history.len() > self.max_history {
            session.history.pop_front();
        }

        debug!(
            "Session '{}' holds {} pairs",
            session_id,
            session.history.len()
        );
    }

    /// Render the last `max_pairs` pairs, oldest first. Empty when there is no history.
    pub fn get_recent_context(&self, session_id: &str, max_pairs: usize) -> String {
        let sessions = self.sessions.read();
        let Some(session) = sessions.get(session_id) else {
            return String::new();
        };

        let skip = session.history.len().saturating_sub(max_pairs);
        session
            .history
            .iter()
            .skip(skip)
            .enumerate()
            .flat_map(|(i, qa)| {
                [
                    format!("Recent Q{}: {}", i + 1, qa.question),
                    format!("Recent A{}: {}", i + 1, qa.answer),
                ]
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `question` looks like it refers back to the conversation.
    pub fn is_likely_followup(&self, question: &str) -> bool {
        self.detector.is_followup(question)
    }

    /// Drop a session's history. No-op for unknown sessions.
    pub fn clear_session(&self, session_id: &str) {
        if self.sessions.write().remove(session_id).is_some() {
            debug!("Cleared session '{}'", session_id);
        }
    }

    /// Snapshot of a session for display.
    pub fn get_context(&self, session_id: &str) -> ConversationContext {
        let sessions = self.sessions.read();
        let Some(session) = sessions.get(session_id) else {
            return ConversationContext {
                qa_pairs: Vec::new(),
                count: 0,
                last_topic: None,
            };
        };

        ConversationContext {
            qa_pairs: session
                .history
                .iter()
                .map(|qa| QaSummary {
                    question: qa.question.clone(),
                    answer: truncate_chars(&qa.answer, CONTEXT_ANSWER_CHARS),
                })
                .collect(),
            count: session.history.len(),
            last_topic: session.history.back().map(|qa| qa.question.clone()),
        }
    }

    /// Copy of a session's pairs, oldest first.
    pub fn history(&self, session_id: &str) -> Vec<QaPair> {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_stats(&self) -> MemoryStats {
        let sessions = self.sessions.read();
        MemoryStats {
            active_sessions: sessions.len(),
            total_qa_pairs: sessions.values().map(|s| s.history.len()).sum(),
            max_history_per_session: self.max_history,
        }
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Keep the first `max_chars` chars of `text`, adding "..." when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded_fifo() {
        let memory = ConversationMemory::new(4);
        for i in 1..=5 {
            memory.add_qa_pair(&format!("q{}", i), &format!("a{}", i), "s");
        }

        let history = memory.history("s");
        assert_eq!(history.len(), 4);
        assert_eq!(
            history.iter().map(|qa| qa.question.as_str()).collect::<Vec<_>>(),
            ["q2", "q3", "q4", "q5"]
        );

        let context = memory.get_recent_context("s", 3);
        assert_eq!(
            context,
            "Recent Q1: q3\nRecent A1: a3\nRecent Q2: q4\nRecent A2: a4\nRecent Q3: q5\nRecent A3: a5"
        );
    }

    #[test]
    fn test_recent_context_for_unknown_session_is_empty() {
        let memory = ConversationMemory::default();
        assert_eq!(memory.get_recent_context("nobody", 3), "");
    }

    #[test]
    fn test_recent_context_with_fewer_pairs_than_requested() {
        let memory = ConversationMemory::default();
        memory.add_qa_pair("What is a neutron star?", "A collapsed core.", "s");
        assert_eq!(
            memory.get_recent_context("s", 3),
            "Recent Q1: What is a neutron star?\nRecent A1: A collapsed core."
        );
    }

    #[test]
    fn test_answers_are_truncated() {
        let memory = ConversationMemory::default();
        memory.add_qa_pair("q", &"x".repeat(300), "s");
        memory.add_qa_pair("q", &"y".repeat(301), "s");

        let history = memory.history("s");
        assert_eq!(history[0].answer.len(), 300);
        assert_eq!(history[1].answer, format!("{}...", "y".repeat(300)));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("ñandú", 3), "ñan...");
        assert_eq!(truncate_chars("黑洞是什么", 2), "黑洞...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let memory = ConversationMemory::default();
        memory.add_qa_pair("q1", "a1", "alice");
        memory.add_qa_pair("q2", "a2", "bob");

        assert_eq!(memory.history("alice").len(), 1);
        assert_eq!(memory.history("bob")[0].question, "q2");

        memory.clear_session("alice");
        memory.clear_session("alice");
        assert!(memory.history("alice").is_empty());
        assert_eq!(memory.history("bob").len(), 1);
    }

    #[test]
    fn test_get_context_shortens_answers() {
        let memory = ConversationMemory::default();
        memory.add_qa_pair("first", "short answer", "s");
        memory.add_qa_pair("second", &"z".repeat(150), "s");

        let context = memory.get_context("s");
        assert_eq!(context.count, 2);
        assert_eq!(context.last_topic.as_deref(), Some("second"));
        assert_eq!(context.qa_pairs[0].answer, "short answer");
        assert_eq!(context.qa_pairs[1].answer, format!("{}...", "z".repeat(100)));

        let empty = memory.get_context("other");
        assert_eq!(empty.count, 0);
        assert!(empty.last_topic.is_none());
    }

    #[test]
    fn test_stats() {
        let memory = ConversationMemory::new(2);
        memory.add_qa_pair("q1", "a1", "a");
        memory.add_qa_pair("q2", "a2", "a");
        memory.add_qa_pair("q3", "a3", "a");
        memory.add_qa_pair("q1", "a1", "b");

        assert_eq!(
            memory.get_stats(),
            MemoryStats {
                active_sessions: 2,
                total_qa_pairs: 3,
                max_history_per_session: 2,
            }
        );
    }

    struct NeverFollowup;

    impl FollowupDetector for NeverFollowup {
        fn is_followup(&self, _question: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_custom_detector() {
        let memory = ConversationMemory::default();
        assert!(memory.is_likely_followup("Why?"));

        let memory = memory.with_detector(Arc::new(NeverFollowup));
        assert!(!memory.is_likely_followup("Why?"));
    }
}
