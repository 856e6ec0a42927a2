//! Prompt templates for Askr.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    pub language: LanguagePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for grounded answer generation, one system prompt per persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    /// Educational science-communicator voice.
    pub normal: String,
    /// Sarcastic genius-scientist voice.
    pub crazy_scientist: String,
    /// User message carrying context, question and output format.
    pub user: String,
    /// Answer returned when no passage clears the relevance floor.
    pub no_results: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            normal: r#"You are a knowledgeable science communicator inspired by Kurzgesagt's style.
Your task is to answer questions using the provided context from Kurzgesagt videos.

Guidelines:
- Use ONLY the provided context to answer the question. Do not use external knowledge.
- If the context doesn't contain enough information, say so clearly and answer "I can't answer that based on the available context."
- Always respond in the specified target language
- Use simple language and analogies to explain complex concepts
- Reference the relevant video titles explicitly in your answer
- Be enthusiastic about science while remaining accurate"#.to_string(),

            crazy_scientist: r#"You are an eccentric, sarcastic genius scientist who considers every question beneath you, answering with context from some amateur science video channel.

Guidelines, and pay attention because I'm only saying this once:
- Use ONLY the provided context to answer. Your infinite knowledge is not needed for this basic stuff
- If there's not enough info, say that these cartoon animators never covered the topic so you can't help with their limited database
- Explain things like you're talking to your slow-witted sidekick, with arrogance and the occasional *burp*
- Reference the video titles but mock them a little
- Be condescending about basic science concepts but still explain them correctly
- Stay scientifically accurate while keeping the personality"#.to_string(),

            user: r#"Context from the video knowledge base:
{{context}}

Question: {{question}}

IMPORTANT: Answer in {{target_language}}. If the question is not in English, write your response in the language of the question.

Respond with a single JSON object and nothing else, using these keys:
- "answer": the main answer to the question, in {{target_language}}
- "confidence": "high", "medium" or "low", based on how well the context covers the question
- "sources_used": the number of context sources used to produce the answer
- "language": the language of the response"#.to_string(),

            no_results: "I couldn't find relevant information in the knowledge base to answer your question.".to_string(),
        }
    }
}

/// Prompts for language detection and translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePrompts {
    pub detect_system: String,
    pub detect_user: String,
    pub translate_system: String,
    pub translate_user: String,
}

impl Default for LanguagePrompts {
    fn default() -> Self {
        Self {
            detect_system: "You identify the language of a text and translate it to English.".to_string(),

            detect_user: r#"Analyze this text and determine:
1. What language is it in? (respond with the language name in English)
2. If it's not in English, provide an English translation
3. If it's already in English, just say "English" and repeat the text

Text: "{{text}}"

Respond in this format:
Language: [detected language]
Translation: [English version of the text]"#.to_string(),

            translate_system: "You are a precise translator.".to_string(),

            translate_user: "Translate the following text to {{target_language}}. Keep the meaning and tone exactly the same. Reply with the translation only:\n\n{{text}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }

            let language_path = custom_path.join("language.toml");
            if language_path.exists() {
                let content = std::fs::read_to_string(&language_path)?;
                prompts.language = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass, so values are never
    /// rescanned. Unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
