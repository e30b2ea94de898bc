use crate::roster::{AgentField, Roster};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Where the scoring service lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Base URL; `/evaluate` and `/evaluate_batch` are appended
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Agent entry of a session file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentEntry {
    /// Generated as `Agent-<n>` when absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub response: String,
    /// Raw metadata text: JSON or free-form
    #[serde(default)]
    pub metadata: String,
}

/// Session file: service settings plus the roster to evaluate
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
}

impl Config {
    /// Load a session from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML session: {}", path.display()))
    }

    /// Build the roster, filling in ids the way `Roster::add` would
    pub fn roster(&self) -> Roster {
        self.agents.iter().fold(Roster::new(), |roster, entry| {
            let roster = roster.add();
            let index = roster.len() - 1;
            let roster = match &entry.id {
                Some(id) => roster.update(index, AgentField::Id, id.as_str()),
                None => roster,
            };
            roster
                .update(index, AgentField::Prompt, entry.prompt.as_str())
                .update(index, AgentField::Response, entry.response.as_str())
                .update(index, AgentField::Metadata, entry.metadata.as_str())
        })
    }
}
