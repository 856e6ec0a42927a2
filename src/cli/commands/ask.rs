//! Ask command implementation.

use super::build_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::Mode;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    mode: &str,
    session: Option<&str>,
    show_passages: bool,
    settings: Settings,
) -> Result<()> {
    let mode: Mode = mode.parse()?;
    let orchestrator = build_orchestrator(settings)?;

    let spinner = Output::spinner("Searching knowledge base...");

    match orchestrator.answer(question, session, mode).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            Output::answer("Askr:", &answer);

            if show_passages && !answer.passages.is_empty() {
                Output::header("Passages");
                for passage in &answer.passages {
                    Output::passage(passage);
                }
                println!();
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
