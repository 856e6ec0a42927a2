//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod serve;
mod stats;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::{router, run_serve};
pub use stats::run_stats;

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::QueryOrchestrator;

/// Run pre-flight checks and build the orchestrator.
fn build_orchestrator(settings: Settings) -> anyhow::Result<QueryOrchestrator> {
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'askr doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Ok(QueryOrchestrator::new(settings)?)
}
