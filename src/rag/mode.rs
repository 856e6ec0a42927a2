//! Answer personas.

use crate::config::Prompts;
use crate::error::AskrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persona used to phrase answers. Part of the cache key, so modes never share answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Normal,
    CrazyScientist,
}

/// Description of a mode for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ModeInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Normal, Mode::CrazyScientist];

    /// Wire name, as used in cache keys and the HTTP API.
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::CrazyScientist => "crazy_scientist",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "Science Communicator",
            Mode::CrazyScientist => "Crazy Scientist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Normal => "Clear, enthusiastic explanations with simple analogies",
            Mode::CrazyScientist => "A sarcastic genius who explains correctly but condescendingly",
        }
    }

    pub fn info(&self) -> ModeInfo {
        ModeInfo {
            id: self.id(),
            name: self.name(),
            description: self.description(),
        }
    }

    /// System prompt for this persona.
    pub fn system_prompt<'a>(&self, prompts: &'a Prompts) -> &'a str {
        match self {
            Mode::Normal => &prompts.answer.normal,
            Mode::CrazyScientist => &prompts.answer.crazy_scientist,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Mode {
    type Err = AskrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "crazy_scientist" | "crazy-scientist" => Ok(Mode::CrazyScientist),
            other => Err(AskrError::InvalidInput(format!(
                "Unknown mode '{}' (expected one of: normal, crazy_scientist)",
                other
            ))),
        }
    }
}
