//! Configuration settings for Askr.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub composer: ComposerSettings,
    pub cache: CacheSettings,
    pub memory: MemorySettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no `-v` flag or `RUST_LOG` is given.
    pub log_level: String,
    /// Session id used when the caller does not supply one.
    pub default_session: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            default_session: "default".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Requested dimensions. `None` keeps the model's native size.
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-ada-002".to_string(),
            dimensions: None,
        }
    }
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalProvider {
    /// Hosted Pinecone index (default).
    #[default]
    Pinecone,
    /// In-process index loaded from a JSON snapshot.
    Memory,
}

impl std::str::FromStr for RetrievalProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinecone" => Ok(RetrievalProvider::Pinecone),
            "memory" | "snapshot" => Ok(RetrievalProvider::Memory),
            _ => Err(format!("Unknown retrieval provider: {}", s)),
        }
    }
}

impl std::fmt::Display for RetrievalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalProvider::Pinecone => write!(f, "pinecone"),
            RetrievalProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Passage retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Vector index backend (pinecone, memory).
    pub provider: RetrievalProvider,
    /// Pinecone index host, e.g. `https://kurzgesagt-transcripts-abc123.svc.pinecone.io`.
    pub pinecone_host: String,
    /// Optional Pinecone namespace.
    pub namespace: Option<String>,
    /// Path to the JSON snapshot (for the memory provider).
    pub snapshot_path: String,
    /// Maximum number of passages handed to the composer.
    pub top_k: usize,
    /// Minimum relevance score for a passage to be used.
    pub relevance_floor: f32,
    /// How many candidates to fetch per kept passage before filtering.
    pub candidate_multiplier: usize,
    /// Metadata field holding the passage title.
    pub title_field: String,
    /// Metadata field holding the passage text.
    pub text_field: String,
    /// Index request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            provider: RetrievalProvider::Pinecone,
            pinecone_host: String::new(),
            namespace: None,
            snapshot_path: "~/.askr/knowledge.json".to_string(),
            top_k: 3,
            relevance_floor: 0.75,
            candidate_multiplier: 2,
            title_field: "video_title".to_string(),
            text_field: "text".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Language model settings for answer composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// Chat model used for answers, language detection and translation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            timeout_secs: 300,
        }
    }
}

/// Semantic cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Minimum cosine similarity for a semantic hit.
    pub similarity_threshold: f32,
    /// Maximum number of cached answers (0 = unbounded).
    pub max_entries: usize,
    /// Lifetime of cached error and degraded answers in seconds (0 = never cache them).
    pub error_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.90,
            max_entries: 1000,
            error_ttl_secs: 60,
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Q&A pairs kept per session.
    pub max_history: usize,
    /// Stored answers are cut to this many characters.
    pub max_answer_chars: usize,
    /// Pairs injected into the prompt for follow-up questions.
    pub followup_context_pairs: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_history: 4,
            max_answer_chars: 300,
            followup_context_pairs: 3,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AskrError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AskrError;

        if !(-1.0..=1.0).contains(&self.cache.similarity_threshold) {
            return Err(AskrError::Config(format!(
                "cache.similarity_threshold must be within [-1, 1], got {}",
                self.cache.similarity_threshold
            )));
        }
        if self.memory.max_history == 0 {
            return Err(AskrError::Config(
                "memory.max_history must be at least 1".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(AskrError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.retrieval.timeout_secs == 0 || self.composer.timeout_secs == 0 {
            return Err(AskrError::Config(
                "request timeouts must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askr")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded knowledge snapshot path.
    pub fn snapshot_path(&self) -> PathBuf {
        Self::expand_path(&self.retrieval.snapshot_path)
    }

    /// Cache lifetime for error and degraded answers, if they should be cached at all.
    pub fn error_ttl(&self) -> Option<std::time::Duration> {
        match self.cache.error_ttl_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.memory.max_history, 4);
        assert_eq!(settings.memory.max_answer_chars, 300);
        assert_eq!(settings.retrieval.top_k, 3);
        assert!((settings.retrieval.relevance_floor - 0.75).abs() < f32::EPSILON);
        assert!((settings.cache.similarity_threshold - 0.90).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.provider, RetrievalProvider::Pinecone);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_retrieval_timeout_is_configurable() {
        let settings: Settings = toml::from_str(
            r#"
            [retrieval]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.retrieval.timeout_secs, 5);
        assert_eq!(Settings::default().retrieval.timeout_secs, 30);

        let mut settings = Settings::default();
        settings.retrieval.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [cache]
            similarity_threshold = 0.85

            [retrieval]
            provider = "memory"
            "#,
        )
        .unwrap();

        assert!((settings.cache.similarity_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(settings.cache.max_entries, 1000);
        assert_eq!(settings.retrieval.provider, RetrievalProvider::Memory);
        assert_eq!(settings.retrieval.top_k, 3);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.memory.max_history = 6;
        settings.composer.model = "gpt-4o-mini".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.memory.max_history, 6);
        assert_eq!(loaded.composer.model, "gpt-4o-mini");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 5000);
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let mut settings = Settings::default();
        settings.memory.max_history = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_error_ttl_zero_disables() {
        let mut settings = Settings::default();
        assert_eq!(settings.error_ttl(), Some(std::time::Duration::from_secs(60)));
        settings.cache.error_ttl_secs = 0;
        assert_eq!(settings.error_ttl(), None);
    }

    #[test]
    fn test_retrieval_provider_parse() {
        assert_eq!("Pinecone".parse::<RetrievalProvider>(), Ok(RetrievalProvider::Pinecone));
        assert_eq!("memory".parse::<RetrievalProvider>(), Ok(RetrievalProvider::Memory));
        assert!("qdrant".parse::<RetrievalProvider>().is_err());
    }
}
