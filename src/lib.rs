//! Askr - Multilingual Question Answering over a Video Knowledge Base
//!
//! Answers questions in any language from a vector index of science video
//! transcripts, with a semantic answer cache and per-session conversation memory.
//!
//! The name "Askr" comes from the Old Norse word for "ash tree", the first man in Norse myth.
//!
//! # Overview
//!
//! Askr allows you to:
//! - Ask questions in any language and get answers in that language
//! - Reuse answers for repeated or paraphrased questions via a semantic cache
//! - Hold follow-up conversations that remember recent exchanges
//! - Switch between answer personas
//! - Serve all of the above over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `embedding` - Embedding generation
//! - `retrieval` - Vector index abstraction (Pinecone, in-memory snapshot)
//! - `cache` - Semantic answer cache and per-key request coalescing
//! - `memory` - Per-session conversation history
//! - `rag` - Language detection, translation and answer composition
//! - `orchestrator` - Query pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use askr::config::Settings;
//! use askr::orchestrator::QueryOrchestrator;
//! use askr::rag::Mode;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = QueryOrchestrator::new(settings)?;
//!
//!     let answer = orchestrator
//!         .answer("¿Qué pasa dentro de un agujero negro?", Some("demo"), Mode::Normal)
//!         .await?;
//!     println!("{} ({})", answer.result.answer, answer.result.confidence);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;

pub use error::{AskrError, Result};
