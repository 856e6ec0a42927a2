//! CLI module for Askr.

pub mod commands;
mod output;
pub mod preflight;
pub mod samples;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Askr - multilingual questions over a video knowledge base
///
/// Answers questions in any language from indexed video transcripts, remembering
/// the conversation and reusing answers to questions it has seen before.
#[derive(Parser, Debug)]
#[command(name = "askr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check API keys and configuration
    Doctor,

    /// Ask a single question
    Ask {
        /// The question to ask, in any language
        question: String,

        /// Answer persona (normal, crazy_scientist)
        #[arg(short, long, default_value = "normal")]
        mode: String,

        /// Conversation session id
        #[arg(short, long)]
        session: Option<String>,

        /// Show the retrieved passages
        #[arg(long)]
        show_passages: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// Answer persona (normal, crazy_scientist)
        #[arg(short, long, default_value = "normal")]
        mode: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show knowledge base statistics
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "askr",
            "-v",
            "ask",
            "¿Qué es un agujero negro?",
            "--mode",
            "crazy_scientist",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ask { question, mode, session, show_passages } => {
                assert_eq!(question, "¿Qué es un agujero negro?");
                assert_eq!(mode, "crazy_scientist");
                assert!(session.is_none());
                assert!(!show_passages);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["askr", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
    }
}
