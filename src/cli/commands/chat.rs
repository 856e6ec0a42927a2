//! Interactive chat command.

use super::build_orchestrator;
use crate::cli::samples::{EXAMPLE_INSTRUCTIONS, EXAMPLE_QUESTIONS};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::QueryOrchestrator;
use crate::rag::Mode;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Clear,
    Context,
    Examples,
    Stats,
    Question(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" => ChatInput::Empty,
        "exit" | "quit" => ChatInput::Exit,
        "clear" => ChatInput::Clear,
        "context" => ChatInput::Context,
        "examples" => ChatInput::Examples,
        "stats" => ChatInput::Stats,
        _ => ChatInput::Question(line),
    }
}

/// Run the interactive chat command.
pub async fn run_chat(mode: &str, settings: Settings) -> Result<()> {
    let mode: Mode = mode.parse()?;
    let session = uuid::Uuid::new_v4().to_string();
    let orchestrator = build_orchestrator(settings)?;

    println!("\n{} ({})", style("Askr Chat").bold().cyan(), mode.name());
    println!(
        "{}\n",
        style("Ask in any language, or type 'exit' to quit. Commands: clear, context, examples, stats.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        match parse_input(&input) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Clear => {
                orchestrator.clear(&session);
                Output::info("Conversation history cleared.");
            }
            ChatInput::Context => print_context(&orchestrator, &session),
            ChatInput::Examples => {
                Output::header("Example questions");
                for example in EXAMPLE_QUESTIONS {
                    Output::list_item(&format!("[{}] {}", example.language, example.question));
                }
                println!("\n{}\n", style(EXAMPLE_INSTRUCTIONS).dim());
            }
            ChatInput::Stats => super::stats::print_stats(&orchestrator).await,
            ChatInput::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let result = orchestrator.answer(question, Some(&session), mode).await;
                spinner.finish_and_clear();

                match result {
                    Ok(answer) => Output::answer("Askr:", &answer),
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

fn print_context(orchestrator: &QueryOrchestrator, session: &str) {
    let context = orchestrator.get_context(session);
    if context.count == 0 {
        Output::info("No conversation yet.");
        return;
    }

    Output::header(&format!("Conversation ({} pairs)", context.count));
    for pair in &context.qa_pairs {
        Output::kv("Q", &pair.question);
        Output::kv("A", &pair.answer);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  \n"), ChatInput::Empty);
        assert_eq!(parse_input("QUIT\n"), ChatInput::Exit);
        assert_eq!(parse_input("clear"), ChatInput::Clear);
        assert_eq!(parse_input("Examples"), ChatInput::Examples);
        assert_eq!(
            parse_input(" What is dark matter?\n"),
            ChatInput::Question("What is dark matter?")
        );
    }
}
