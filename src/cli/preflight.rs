//! Pre-flight checks before expensive operations.
//!
//! Validates that required keys and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{RetrievalProvider, Settings};
use crate::error::{AskrError, Result};

/// Run pre-flight checks for answering questions.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    check_env_key("OPENAI_API_KEY", "sk-...")?;

    match settings.retrieval.provider {
        RetrievalProvider::Pinecone => {
            check_env_key("PINECONE_API_KEY", "pcsk_...")?;
            if settings.retrieval.pinecone_host.is_empty() {
                return Err(AskrError::Config(
                    "retrieval.pinecone_host is not set. Add the index host to your config file."
                        .to_string(),
                ));
            }
        }
        RetrievalProvider::Memory => {
            let path = settings.snapshot_path();
            if !path.exists() {
                return Err(AskrError::Config(format!(
                    "Knowledge snapshot not found at {}",
                    path.display()
                )));
            }
        }
    }

    Ok(())
}

/// Check that an API key is present in the environment.
fn check_env_key(name: &str, example: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(AskrError::Config(format!(
            "{} is empty. Set it with: export {}='{}'",
            name, name, example
        ))),
        Err(_) => Err(AskrError::Config(format!(
            "{} not set. Set it with: export {}='{}'",
            name, name, example
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_is_config_error() {
        let result = check_env_key("ASKR_TEST_KEY_THAT_IS_NEVER_SET", "x");
        match result {
            Err(AskrError::Config(msg)) => assert!(msg.contains("not set")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
