//! RAG (Retrieval-Augmented Generation) answer composition.
//!
//! Turns retrieved passages and a question into a grounded, structured answer
//! in the language the question was asked in.

mod composer;
pub mod context;
mod mode;
mod model;
mod response;

pub use composer::{parse_detection, AnswerComposer, DetectedLanguage};
pub use mode::{Mode, ModeInfo};
pub use model::{LanguageModel, OpenAIChat};
pub use response::{parse_structured, Answer, AnswerResult, Confidence, StructuredReply};
