//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for asking questions, chatting, inspecting and
//! clearing conversations, and reading cache statistics.

use super::build_orchestrator;
use crate::cache::CacheStats;
use crate::cli::samples::{ExampleQuestion, EXAMPLE_INSTRUCTIONS, EXAMPLE_QUESTIONS};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::AskrError;
use crate::memory::{ConversationContext, MemoryStats};
use crate::orchestrator::QueryOrchestrator;
use crate::rag::{Confidence, Mode, ModeInfo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Arc<QueryOrchestrator>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Arc::new(build_orchestrator(settings)?);
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Askr API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Chat", "POST /chat/start, POST /chat/message");
    Output::kv("Conversation", "GET  /conversation/context?session_id=...");
    Output::kv("Clear", "POST /conversation/clear");
    Output::kv("Stats", "GET  /stats");
    Output::kv("Modes", "GET  /modes");
    Output::kv("Examples", "GET  /examples");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router around a shared orchestrator.
pub fn router(orchestrator: Arc<QueryOrchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/chat/start", post(start_chat))
        .route("/chat/message", post(chat_message))
        .route("/conversation/context", get(conversation_context))
        .route("/conversation/clear", post(clear_conversation))
        .route("/stats", get(stats))
        .route("/modes", get(modes))
        .route("/examples", get(examples))
        .layer(cors)
        .with_state(Arc::new(AppState { orchestrator }))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    confidence: Confidence,
    sources: Vec<String>,
    sources_used: usize,
    language: String,
    session_id: String,
    is_follow_up: bool,
    mode: Mode,
}

#[derive(Deserialize)]
struct ChatMessageRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Serialize)]
struct ChatStartResponse {
    session_id: String,
    message: &'static str,
    instructions: ChatInstructions,
}

#[derive(Serialize)]
struct ChatInstructions {
    description: &'static str,
    supported_languages: &'static [&'static str],
    commands: ChatCommands,
}

#[derive(Serialize)]
struct ChatCommands {
    examples: &'static str,
    quit: &'static str,
}

const SUPPORTED_LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "French",
    "German",
    "Italian",
    "Portuguese",
    "etc.",
];

/// Reply to a chat message, tagged by `type`.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatReply {
    Examples {
        examples: &'static [ExampleQuestion],
        session_id: String,
        mode: Mode,
    },
    Quit {
        message: &'static str,
        session_id: String,
        mode: Mode,
    },
    Answer(ChatAnswer),
}

#[derive(Serialize)]
struct ChatAnswer {
    question: String,
    #[serde(flatten)]
    reply: AskResponse,
}

#[derive(Deserialize)]
struct SessionQuery {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ContextResponse {
    session_id: String,
    context: ConversationContext,
}

#[derive(Serialize)]
struct ClearResponse {
    message: String,
    session_id: String,
}

#[derive(Serialize)]
struct StatsResponse {
    cache_stats: CacheStats,
    memory_stats: MemoryStats,
    knowledge_base: KnowledgeBaseStats,
}

#[derive(Serialize)]
struct KnowledgeBaseStats {
    total_vectors: Option<u64>,
}

#[derive(Serialize)]
struct ModesResponse {
    modes: Vec<ModeInfo>,
    default: Mode,
}

#[derive(Serialize)]
struct ExamplesResponse {
    examples: &'static [ExampleQuestion],
    instructions: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

/// The caller's session id, or the default when none was given.
fn session_or_default(session_id: Option<String>, state: &AppState) -> String {
    session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.orchestrator.settings().general.default_session.clone())
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    if req.question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Question is required");
    }

    let mode = match parse_mode(req.mode.as_deref()) {
        Ok(mode) => mode,
        Err(response) => return response,
    };

    match answer_question(&state, &req.question, new_session_if_missing(req.session_id), mode).await {
        Ok(reply) => Json(reply).into_response(),
        Err(response) => response,
    }
}

async fn start_chat() -> impl IntoResponse {
    Json(ChatStartResponse {
        session_id: uuid::Uuid::new_v4().to_string(),
        message: "Interactive chat session started",
        instructions: ChatInstructions {
            description: "Ask questions in any language - answers will be in the same language!",
            supported_languages: SUPPORTED_LANGUAGES,
            commands: ChatCommands {
                examples: "Type 'examples' to see sample questions",
                quit: "Type 'quit' to end the session",
            },
        },
    })
}

async fn chat_message(State(state): State<Arc<AppState>>, Json(req): Json<ChatMessageRequest>) -> Response {
    let message = req.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message is required");
    }

    let mode = match parse_mode(req.mode.as_deref()) {
        Ok(mode) => mode,
        Err(response) => return response,
    };
    let session_id = new_session_if_missing(req.session_id);

    let reply = match message.to_lowercase().as_str() {
        "examples" => ChatReply::Examples {
            examples: EXAMPLE_QUESTIONS,
            session_id,
            mode,
        },
        "quit" | "exit" | "q" => ChatReply::Quit {
            message: "Thanks for exploring science with Askr!",
            session_id,
            mode,
        },
        _ => match answer_question(&state, message, session_id, mode).await {
            Ok(reply) => ChatReply::Answer(ChatAnswer {
                question: message.to_string(),
                reply,
            }),
            Err(response) => return response,
        },
    };

    Json(reply).into_response()
}

/// Parse an optional mode name, defaulting to [`Mode::Normal`].
fn parse_mode(mode: Option<&str>) -> std::result::Result<Mode, Response> {
    match mode {
        None => Ok(Mode::default()),
        Some(mode) => mode
            .parse::<Mode>()
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string())),
    }
}

/// Callers without a session get a fresh one they can send back.
fn new_session_if_missing(session_id: Option<String>) -> String {
    session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

async fn answer_question(
    state: &AppState,
    question: &str,
    session_id: String,
    mode: Mode,
) -> std::result::Result<AskResponse, Response> {
    match state
        .orchestrator
        .answer(question, Some(&session_id), mode)
        .await
    {
        Ok(answer) => {
            info!(
                "Answered question for session {} with {} confidence",
                session_id, answer.result.confidence
            );
            let result = answer.result;
            Ok(AskResponse {
                answer: result.answer,
                confidence: result.confidence,
                sources: result.sources,
                sources_used: result.sources_used,
                language: result.language,
                session_id,
                is_follow_up: result.is_follow_up,
                mode,
            })
        }
        Err(AskrError::EmptyInput) => Err(error_response(
            StatusCode::BAD_REQUEST,
            "Question is required",
        )),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("An error occurred while processing your question: {}", e),
        )),
    }
}

async fn conversation_context(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let session_id = session_or_default(query.session_id, &state);
    let context = state.orchestrator.get_context(&session_id);
    Json(ContextResponse { session_id, context })
}

async fn clear_conversation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionQuery>,
) -> impl IntoResponse {
    let session_id = session_or_default(req.session_id, &state);
    state.orchestrator.clear(&session_id);
    Json(ClearResponse {
        message: "Conversation cleared successfully".to_string(),
        session_id,
    })
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let total_vectors = match state.orchestrator.vector_count().await {
        Ok(count) => count,
        Err(e) => {
            warn!("Could not read index stats: {}", e);
            None
        }
    };

    Json(StatsResponse {
        cache_stats: state.orchestrator.cache_stats(),
        memory_stats: state.orchestrator.memory_stats(),
        knowledge_base: KnowledgeBaseStats { total_vectors },
    })
}

async fn modes() -> impl IntoResponse {
    Json(ModesResponse {
        modes: Mode::ALL.iter().map(Mode::info).collect(),
        default: Mode::default(),
    })
}

async fn examples() -> impl IntoResponse {
    Json(ExamplesResponse {
        examples: EXAMPLE_QUESTIONS,
        instructions: EXAMPLE_INSTRUCTIONS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::embedding::Embedder;
    use crate::error::Result;
    use crate::rag::LanguageModel;
    use crate::retrieval::{Passage, VectorIndex};
    use async_trait::async_trait;
    use serde_json::Value;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct OnePassage;

    #[async_trait]
    impl VectorIndex for OnePassage {
        async fn query(&self, _embedding: &[f32], _top_k: usize) -> Result<Vec<Passage>> {
            Ok(vec![Passage {
                id: "bh-1".to_string(),
                text: "Black holes bend spacetime.".to_string(),
                score: 0.9,
                source_title: "Black Holes Explained".to_string(),
                source: None,
            }])
        }

        async fn vector_count(&self) -> Result<Option<u64>> {
            Ok(Some(1))
        }
    }

    struct EnglishModel;

    #[async_trait]
    impl LanguageModel for EnglishModel {
        async fn complete(&self, system: &str, _user: &str) -> Result<String> {
            if system == Prompts::default().language.detect_system {
                return Ok("Language: English".to_string());
            }
            Ok(r#"{"answer": "They bend spacetime.", "confidence": "high", "sources_used": 1, "language": "English"}"#.to_string())
        }
    }

    fn state() -> Arc<AppState> {
        let orchestrator = QueryOrchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(FixedEmbedder),
            Arc::new(OnePassage),
            Arc::new(EnglishModel),
        );
        Arc::new(AppState {
            orchestrator: Arc::new(orchestrator),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ask_request(question: &str, session_id: Option<&str>, mode: Option<&str>) -> Json<AskRequest> {
        Json(AskRequest {
            question: question.to_string(),
            session_id: session_id.map(str::to_string),
            mode: mode.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_ask_returns_answer_and_session() {
        let response = ask(State(state()), ask_request("What do black holes do?", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["answer"], "They bend spacetime.");
        assert_eq!(body["confidence"], "high");
        assert_eq!(body["sources"][0], "Black Holes Explained");
        assert_eq!(body["mode"], "normal");
        assert_eq!(body["is_follow_up"], false);
        let session = body["session_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(session).is_ok());
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_question_and_unknown_mode() {
        let response = ask(State(state()), ask_request("  ", None, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Question is required");

        let response = ask(State(state()), ask_request("Why?", None, Some("pirate"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_context_and_clear() {
        let state = state();
        ask(
            State(state.clone()),
            ask_request("What do black holes do?", Some("s1"), Some("crazy_scientist")),
        )
        .await;

        let response = conversation_context(
            State(state.clone()),
            Query(SessionQuery {
                session_id: Some("s1".to_string()),
            }),
        )
        .await
        .into_response();
        let body = body_json(response).await;
        assert_eq!(body["session_id"], "s1");
        assert_eq!(body["context"]["count"], 1);
        assert_eq!(body["context"]["last_topic"], "What do black holes do?");

        let response = clear_conversation(
            State(state.clone()),
            Json(SessionQuery {
                session_id: Some("s1".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(body_json(response).await["session_id"], "s1");
        assert_eq!(state.orchestrator.get_context("s1").count, 0);
    }

    #[tokio::test]
    async fn test_stats_and_modes() {
        let state = state();
        ask(State(state.clone()), ask_request("What do black holes do?", None, None)).await;

        let body = body_json(stats(State(state)).await.into_response()).await;
        assert_eq!(body["cache_stats"]["total_queries"], 1);
        assert_eq!(body["memory_stats"]["total_qa_pairs"], 1);
        assert_eq!(body["knowledge_base"]["total_vectors"], 1);

        let body = body_json(modes().await.into_response()).await;
        assert_eq!(body["modes"].as_array().unwrap().len(), 2);
        assert_eq!(body["modes"][1]["id"], "crazy_scientist");
        assert_eq!(body["default"], "normal");
    }

    fn chat_request(message: &str, session_id: Option<&str>) -> Json<ChatMessageRequest> {
        Json(ChatMessageRequest {
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
            mode: None,
        })
    }

    #[tokio::test]
    async fn test_start_chat_issues_session() {
        let body = body_json(start_chat().await.into_response()).await;
        assert!(uuid::Uuid::parse_str(body["session_id"].as_str().unwrap()).is_ok());
        assert_eq!(body["instructions"]["commands"]["quit"], "Type 'quit' to end the session");
    }

    #[tokio::test]
    async fn test_chat_message_commands() {
        let response = chat_message(State(state()), chat_request("Examples", Some("c1"))).await;
        let body = body_json(response).await;
        assert_eq!(body["type"], "examples");
        assert_eq!(body["session_id"], "c1");
        assert_eq!(body["examples"].as_array().unwrap().len(), EXAMPLE_QUESTIONS.len());

        let body = body_json(chat_message(State(state()), chat_request(" q ", Some("c1"))).await).await;
        assert_eq!(body["type"], "quit");
        assert_eq!(body["mode"], "normal");

        let response = chat_message(State(state()), chat_request("   ", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_message_answers_question() {
        let state = state();
        let response = chat_message(
            State(state.clone()),
            chat_request("What do black holes do?", Some("c2")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["type"], "answer");
        assert_eq!(body["question"], "What do black holes do?");
        assert_eq!(body["answer"], "They bend spacetime.");
        assert_eq!(body["session_id"], "c2");
        assert_eq!(state.orchestrator.get_context("c2").count, 1);
    }

    #[tokio::test]
    async fn test_examples() {
        let body = body_json(examples().await.into_response()).await;
        assert_eq!(body["examples"].as_array().unwrap().len(), EXAMPLE_QUESTIONS.len());
        assert_eq!(body["examples"][1]["language"], "Spanish");
    }
}
