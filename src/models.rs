use crate::metadata::Metadata;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One agent output entered by the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Identifier, unique within the roster
    pub id: String,
    /// Prompt given to the agent
    pub prompt: String,
    /// Agent's response to the prompt
    pub response: String,
    /// Metadata exactly as typed: JSON or free text
    #[serde(rename = "metadata", default)]
    pub raw_metadata: String,
}

impl AgentRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Build the request body for this record, normalizing metadata on the way
    pub fn to_payload(&self) -> AgentPayload {
        AgentPayload {
            prompt: self.prompt.clone(),
            response: self.response.clone(),
            metadata: Metadata::normalize(&self.raw_metadata),
        }
    }
}

/// Body of a single scoring request, also one entry of a batch request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPayload {
    pub prompt: String,
    pub response: String,
    pub metadata: Metadata,
}

/// Body of an aggregate scoring request
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest {
    pub agents: Vec<AgentPayload>,
}

/// Per-dimension score and the evaluator's reasoning for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDetail {
    /// Score on a 0 to 10 scale
    pub score: f64,
    #[serde(default)]
    pub justification: String,
    /// Any other fields the service sent, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Successful response of the single-item scoring endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Normalized scores (0.0 to 1.0), in the order the service sent them
    pub scores: IndexMap<String, f64>,
    #[serde(default)]
    pub details: IndexMap<String, DimensionDetail>,
    /// Combined explanation across all dimensions
    #[serde(default)]
    pub explanation: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Why an evaluation failed
///
/// Serialized untagged: consumers see the service's body or a plain
/// description, without knowing which one it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// Body returned by the scoring service when it rejected the request
    Service(serde_json::Value),
    /// Description of a failure where no usable body came back
    Transport(String),
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPayload::Service(body) => write!(f, "{}", body),
            ErrorPayload::Transport(message) => f.write_str(message),
        }
    }
}

/// Outcome of evaluating a single agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationResult {
    Failed { error: ErrorPayload },
    Scored(Evaluation),
}

impl EvaluationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, EvaluationResult::Failed { .. })
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            EvaluationResult::Scored(evaluation) => Some(evaluation),
            EvaluationResult::Failed { .. } => None,
        }
    }
}

/// Results of one dispatch cycle keyed by agent id, in roster order
pub type ResultsMap = IndexMap<String, EvaluationResult>;

/// Fixed dimensions reported by the batch leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    InstructionFollowing,
    Coherence,
    AssumptionControl,
    Hallucination,
}

impl Dimension {
    /// Stacking order of the heatmap segments
    pub const ALL: [Dimension; 4] = [
        Dimension::InstructionFollowing,
        Dimension::Coherence,
        Dimension::AssumptionControl,
        Dimension::Hallucination,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Dimension::InstructionFollowing => "instruction_following",
            Dimension::Coherence => "coherence",
            Dimension::AssumptionControl => "assumption_control",
            Dimension::Hallucination => "hallucination",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::InstructionFollowing => "Instruction Following",
            Dimension::Coherence => "Coherence",
            Dimension::AssumptionControl => "Assumption Control",
            Dimension::Hallucination => "Hallucination",
        }
    }
}

/// One agent's scores from a batch evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub agent_id: String,
    pub instruction_following: f64,
    pub coherence: f64,
    pub assumption_control: f64,
    pub hallucination: f64,
}

impl LeaderboardRow {
    pub fn score(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::InstructionFollowing => self.instruction_following,
            Dimension::Coherence => self.coherence,
            Dimension::AssumptionControl => self.assumption_control,
            Dimension::Hallucination => self.hallucination,
        }
    }
}

/// Response of the aggregate scoring endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Rows in the order the service ranked them
    pub leaderboard: Vec<LeaderboardRow>,
}
