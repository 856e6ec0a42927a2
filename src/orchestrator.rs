//! Query orchestrator for Askr.
//!
//! Coordinates a question end to end: follow-up detection, cache lookup,
//! language detection, retrieval, answer composition and bookkeeping.

use crate::cache::{CacheStats, KeyedLocks, SemanticCache};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{AskrError, Result};
use crate::memory::{ConversationContext, ConversationMemory, MemoryStats};
use crate::rag::context::{format_passages, source_titles, with_conversation};
use crate::rag::{
    parse_structured, AnswerComposer, Answer, AnswerResult, Confidence, DetectedLanguage,
    LanguageModel, Mode, OpenAIChat,
};
use crate::retrieval::{create_index, KnowledgeRetriever, Passage, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Build the cache key for a question asked in a given mode.
pub fn cache_key(question: &str, mode: Mode) -> String {
    format!("{}{}", question, mode_suffix(mode))
}

fn mode_suffix(mode: Mode) -> String {
    format!("||MODE:{}", mode)
}

/// Whether a computed answer is good for the cache's lifetime or only briefly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Complete,
    Degraded,
}

/// Answers questions against the knowledge base.
pub struct QueryOrchestrator {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    retriever: KnowledgeRetriever,
    composer: AnswerComposer,
    cache: SemanticCache<Answer>,
    memory: ConversationMemory,
    in_flight: KeyedLocks,
}

impl QueryOrchestrator {
    /// Create an orchestrator with the configured OpenAI and index backends.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let index = create_index(&settings)?;
        let model: Arc<dyn LanguageModel> = Arc::new(OpenAIChat::from_settings(&settings.composer)?);

        info!(
            "Using {} retrieval with {} for answers",
            settings.retrieval.provider, settings.composer.model
        );

        Ok(Self::with_components(settings, prompts, embedder, index, model))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let retriever = KnowledgeRetriever::new(index, embedder.clone())
            .with_top_k(settings.retrieval.top_k)
            .with_relevance_floor(settings.retrieval.relevance_floor)
            .with_candidate_multiplier(settings.retrieval.candidate_multiplier);

        Self {
            embedder,
            retriever,
            composer: AnswerComposer::new(model).with_prompts(prompts),
            cache: SemanticCache::from_settings(&settings.cache),
            memory: ConversationMemory::from_settings(&settings.memory),
            in_flight: KeyedLocks::new(),
            settings,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Answer a question for a session (the configured default session when `None`).
    ///
    /// Only a blank question is an error; every other failure is folded into a
    /// low-confidence answer.
    #[instrument(skip(self, question))]
    pub async fn answer(&self, question: &str, session_id: Option<&str>, mode: Mode) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskrError::EmptyInput);
        }
        let session = session_id.unwrap_or(self.settings.general.default_session.as_str());

        let is_follow_up = self.memory.is_likely_followup(question);
        let conversation = if is_follow_up {
            self.memory
                .get_recent_context(session, self.settings.memory.followup_context_pairs)
        } else {
            String::new()
        };

        let key = cache_key(question, mode);

        if let Some(entry) = self.cache.get_exact(&key) {
            debug!("Exact cache hit");
            return Ok(self.remember(question, session, entry.result));
        }

        let embedding = match self.embedder.embed(question).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!("Could not embed question, skipping similarity lookup: {}", e);
                None
            }
        };

        if let Some(embedding) = &embedding {
            let suffix = mode_suffix(mode);
            if let Some(hit) = self
                .cache
                .find_similar_where(embedding, |k| k.ends_with(&suffix))
            {
                debug!("Semantic cache hit on '{}' ({:.3})", hit.key, hit.similarity);
                return Ok(self.remember(question, session, hit.result));
            }
        }

        let _guard = self.in_flight.lock(&key).await;

        // Another task may have answered the same question while we waited.
        if let Some(entry) = self.cache.get_exact(&key) {
            debug!("Answered by a concurrent request");
            return Ok(self.remember(question, session, entry.result));
        }

        let (answer, outcome) = self
            .compute(question, embedding.as_deref(), &conversation, is_follow_up, mode)
            .await;

        self.store(&key, embedding, &answer, outcome);
        Ok(self.remember(question, session, answer))
    }

    async fn compute(
        &self,
        question: &str,
        embedding: Option<&[f32]>,
        conversation: &str,
        is_follow_up: bool,
        mode: Mode,
    ) -> (Answer, Outcome) {
        let language = self.composer.detect_language(question).await;

        // The question embedding doubles as the retrieval query when no translation happened.
        let retrieved = match embedding {
            Some(embedding) if language.english_text == question => {
                self.retriever.search_embedding(embedding).await
            }
            _ => self.retriever.search(&language.english_text).await,
        };

        let (passages, outcome) = match retrieved {
            Ok(passages) => (passages, Outcome::Complete),
            Err(e) => {
                warn!("Retrieval failed, answering without context: {}", e);
                (Vec::new(), Outcome::Degraded)
            }
        };

        if passages.is_empty() {
            info!("No passage cleared the relevance floor");
            let answer = self.no_results_answer(&language, is_follow_up).await;
            return (answer, outcome);
        }

        let mut context = format_passages(&passages);
        if is_follow_up {
            context = with_conversation(conversation, &context);
        }

        let raw = match self
            .composer
            .compose(question, &context, language.target_language(), mode)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Answer composition failed: {}", e);
                let answer = Answer {
                    result: AnswerResult::error(e, is_follow_up),
                    passages: Vec::new(),
                    language: "English".to_string(),
                };
                return (answer, Outcome::Degraded);
            }
        };

        let result = build_result(raw, &passages, &language, is_follow_up);
        debug!(
            "Composed answer with {} confidence from {} passages",
            result.confidence,
            passages.len()
        );

        (
            Answer {
                result,
                passages,
                language: language.name,
            },
            Outcome::Complete,
        )
    }

    async fn no_results_answer(&self, language: &DetectedLanguage, is_follow_up: bool) -> Answer {
        let message = self.composer.no_results_message(language).await;
        Answer {
            result: AnswerResult {
                answer: message.clone(),
                confidence: Confidence::Low,
                sources_used: 0,
                language: language.name.clone(),
                sources: Vec::new(),
                raw_response: message,
                is_follow_up,
            },
            passages: Vec::new(),
            language: language.name.clone(),
        }
    }

    fn store(&self, key: &str, embedding: Option<Vec<f32>>, answer: &Answer, outcome: Outcome) {
        let Some(embedding) = embedding else {
            debug!("No question embedding, answer not cached");
            return;
        };

        match outcome {
            Outcome::Complete => self.cache.add(key, embedding, answer.clone()),
            Outcome::Degraded => match self.settings.error_ttl() {
                Some(ttl) => self.cache.add_with_ttl(key, embedding, answer.clone(), ttl),
                None => debug!("Degraded answer not cached"),
            },
        }
    }

    fn remember(&self, question: &str, session: &str, answer: Answer) -> Answer {
        self.memory.add_qa_pair(question, &answer.result.answer, session);
        answer
    }

    /// Snapshot of a session's conversation.
    pub fn get_context(&self, session_id: &str) -> ConversationContext {
        self.memory.get_context(session_id)
    }

    /// Forget a session's conversation.
    pub fn clear(&self, session_id: &str) {
        self.memory.clear_session(session_id);
    }

    /// Drop every cached answer.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.memory.get_stats()
    }

    /// Number of vectors in the knowledge index, if the backend reports it.
    pub async fn vector_count(&self) -> Result<Option<u64>> {
        self.retriever.index().vector_count().await
    }
}

/// Turn a raw model reply into an answer, falling back to the raw text.
fn build_result(
    raw: String,
    passages: &[Passage],
    language: &DetectedLanguage,
    is_follow_up: bool,
) -> AnswerResult {
    let sources = source_titles(passages);

    match parse_structured(&raw) {
        Some(reply) => AnswerResult {
            answer: reply.answer.unwrap_or_else(|| raw.clone()),
            confidence: reply.confidence.unwrap_or(Confidence::Medium),
            sources_used: reply.sources_used.unwrap_or(passages.len()),
            language: reply.language.unwrap_or_else(|| language.name.clone()),
            sources,
            raw_response: raw,
            is_follow_up,
        },
        None => {
            debug!("Model reply was not structured, using raw text");
            AnswerResult {
                answer: raw.clone(),
                confidence: Confidence::Medium,
                sources_used: passages.len(),
                language: language.name.clone(),
                sources,
                raw_response: raw,
                is_follow_up,
            }
        }
    }
}
