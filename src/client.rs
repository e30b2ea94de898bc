use crate::config::ServiceConfig;
use crate::models::{AgentPayload, BatchRequest, BatchResult, ErrorPayload, Evaluation};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const EVALUATE_PATH: &str = "evaluate";
const EVALUATE_BATCH_PATH: &str = "evaluate_batch";

/// Errors from a single call to the scoring service
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered but refused to score; `body` is what it said
    #[error("scoring service rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: Value },

    /// A success response whose body is not what the endpoint promises
    #[error("malformed response from scoring service: {0}")]
    Decode(String),
}

impl ScoreError {
    /// Shape this error takes inside a results map
    pub fn into_payload(self) -> ErrorPayload {
        match self {
            ScoreError::Rejected { body, .. } => ErrorPayload::Service(body),
            other => ErrorPayload::Transport(other.to_string()),
        }
    }
}

/// Remote service that computes scores and justifications
// Requests are polled on the caller's task, so the futures need not be Send.
#[allow(async_fn_in_trait)]
pub trait ScoringService {
    /// Score one prompt/response/metadata triple
    async fn evaluate(&self, payload: &AgentPayload) -> Result<Evaluation, ScoreError>;

    /// Score a whole set of agents together and rank them
    async fn evaluate_batch(&self, request: &BatchRequest) -> Result<BatchResult, ScoreError>;
}

/// HTTP client for the scoring service
pub struct ScoringClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ScoringClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// POST a JSON body and decode the success response
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ScoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "Sending scoring request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ScoreError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ScoreError::Rejected {
                status: status.as_u16(),
                body: Self::parse_error_body(text),
            });
        }

        let value: Value =
            serde_json::from_str(&text).map_err(|e| ScoreError::Decode(e.to_string()))?;

        // The service reports evaluator exceptions as `{"error": ...}` with a 200.
        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            return Err(ScoreError::Rejected {
                status: status.as_u16(),
                body: error.clone(),
            });
        }

        serde_json::from_value(value).map_err(|e| ScoreError::Decode(e.to_string()))
    }

    /// Keep structured error bodies as JSON, anything else as a string
    fn parse_error_body(text: String) -> Value {
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => Value::String(text),
        }
    }
}

impl ScoringService for ScoringClient {
    async fn evaluate(&self, payload: &AgentPayload) -> Result<Evaluation, ScoreError> {
        self.post(EVALUATE_PATH, payload).await
    }

    async fn evaluate_batch(&self, request: &BatchRequest) -> Result<BatchResult, ScoreError> {
        self.post(EVALUATE_BATCH_PATH, request).await
    }
}
