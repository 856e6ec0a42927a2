//! Stats command implementation.

use super::build_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::QueryOrchestrator;
use anyhow::Result;

/// Run the stats command.
pub async fn run_stats(settings: Settings) -> Result<()> {
    let orchestrator = build_orchestrator(settings)?;
    print_stats(&orchestrator).await;
    Ok(())
}

/// Print knowledge base, cache and memory statistics.
pub(super) async fn print_stats(orchestrator: &QueryOrchestrator) {
    Output::header("Knowledge base");
    match orchestrator.vector_count().await {
        Ok(Some(count)) => Output::kv("Vectors", &count.to_string()),
        Ok(None) => Output::kv("Vectors", "unknown"),
        Err(e) => Output::warning(&format!("Could not reach the index: {}", e)),
    }

    let cache = orchestrator.cache_stats();
    Output::header("Cache");
    Output::kv("Entries", &cache.total_queries.to_string());
    Output::kv(
        "Capacity",
        &match cache.max_entries {
            0 => "unbounded".to_string(),
            n => n.to_string(),
        },
    );
    Output::kv("Similarity threshold", &format!("{:.2}", cache.threshold));
    Output::kv("Exact hits", &cache.exact_hits.to_string());
    Output::kv("Semantic hits", &cache.semantic_hits.to_string());
    Output::kv("Misses", &cache.misses.to_string());
    Output::kv("Evictions", &cache.evictions.to_string());

    let memory = orchestrator.memory_stats();
    Output::header("Conversation memory");
    Output::kv("Active sessions", &memory.active_sessions.to_string());
    Output::kv("Q&A pairs", &memory.total_qa_pairs.to_string());
    Output::kv("Pairs per session", &memory.max_history_per_session.to_string());
    println!();
}
