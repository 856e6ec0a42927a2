//! Prompt construction on top of a [`LanguageModel`].

use super::{LanguageModel, Mode};
use crate::config::Prompts;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const UNKNOWN_LANGUAGE: &str = "unknown";

/// Result of language detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    /// Language name in English, or "unknown" when detection failed.
    pub name: String,
    /// English rendering of the text (the original text when already English or unknown).
    pub english_text: String,
}

impl DetectedLanguage {
    fn unknown(text: &str) -> Self {
        Self {
            name: UNKNOWN_LANGUAGE.to_string(),
            english_text: text.to_string(),
        }
    }

    pub fn is_english(&self) -> bool {
        self.name.eq_ignore_ascii_case("english")
    }

    pub fn is_unknown(&self) -> bool {
        self.name.eq_ignore_ascii_case(UNKNOWN_LANGUAGE)
    }

    /// Language the answer should be written in.
    pub fn target_language(&self) -> &str {
        if self.is_unknown() {
            "the language of the question"
        } else {
            &self.name
        }
    }
}

/// Builds detection, translation and answer prompts and sends them to the model.
pub struct AnswerComposer {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Detect the language of `text` and translate it to English.
    ///
    /// Never fails: a model error yields language "unknown" and the original text.
    #[instrument(skip(self, text))]
    pub async fn detect_language(&self, text: &str) -> DetectedLanguage {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        let user = self
            .prompts
            .render_with_custom(&self.prompts.language.detect_user, &vars);

        match self
            .model
            .complete(&self.prompts.language.detect_system, &user)
            .await
        {
            Ok(reply) => {
                let detected = parse_detection(&reply, text);
                debug!("Detected language: {}", detected.name);
                detected
            }
            Err(e) => {
                warn!("Language detection failed: {}", e);
                DetectedLanguage::unknown(text)
            }
        }
    }

    /// Translate `text` into `target_language`.
    ///
    /// English and unknown targets return the text as is, as does a model error.
    #[instrument(skip(self, text))]
    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        if target_language.eq_ignore_ascii_case("english")
            || target_language.eq_ignore_ascii_case(UNKNOWN_LANGUAGE)
        {
            return text.to_string();
        }

        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        vars.insert("target_language".to_string(), target_language.to_string());
        let user = self
            .prompts
            .render_with_custom(&self.prompts.language.translate_user, &vars);

        match self
            .model
            .complete(&self.prompts.language.translate_system, &user)
            .await
        {
            Ok(translated) if !translated.trim().is_empty() => translated.trim().to_string(),
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!("Translation to {} failed: {}", target_language, e);
                text.to_string()
            }
        }
    }

    /// Answer used when retrieval finds nothing, in the question's language.
    pub async fn no_results_message(&self, language: &DetectedLanguage) -> String {
        let message = &self.prompts.answer.no_results;
        if language.is_english() || language.is_unknown() {
            return message.clone();
        }
        self.translate(message, &language.name).await
    }

    /// Ask the model for a grounded answer. Returns the raw reply.
    #[instrument(skip(self, question, context))]
    pub async fn compose(
        &self,
        question: &str,
        context: &str,
        target_language: &str,
        mode: Mode,
    ) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.to_string());
        vars.insert("target_language".to_string(), target_language.to_string());

        let system = self
            .prompts
            .render_with_custom(mode.system_prompt(&self.prompts), &vars);
        let user = self.prompts.render_with_custom(&self.prompts.answer.user, &vars);

        self.model.complete(&system, &user).await
    }
}

/// Parse a `Language: X` / `Translation: Y` reply.
///
/// Missing lines default to English and the original text.
pub fn parse_detection(reply: &str, original: &str) -> DetectedLanguage {
    let mut name = "English".to_string();
    let mut english_text = original.to_string();

    for line in reply.trim().lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Language:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                name = rest.to_string();
            }
        } else if let Some(rest) = line.strip_prefix("Translation:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                english_text = rest.to_string();
            }
        }
    }

    DetectedLanguage { name, english_text }
}
