use crate::client::ScoringService;
use crate::metadata::Metadata;
use crate::models::{AgentPayload, BatchRequest, BatchResult};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One CSV row as read from the batch file; every column is optional
#[derive(Debug, Deserialize)]
struct BatchRow {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    metadata: Option<String>,
}

impl BatchRow {
    /// Rows without both a prompt and a response are not scoreable
    fn into_payload(self) -> Option<AgentPayload> {
        match (self.prompt, self.response) {
            (Some(prompt), Some(response)) if !prompt.is_empty() && !response.is_empty() => {
                Some(AgentPayload {
                    prompt,
                    response,
                    metadata: Metadata::normalize_batch_field(self.metadata.as_deref()),
                })
            }
            _ => None,
        }
    }
}

/// Parse header-delimited CSV into request payloads, dropping incomplete rows
///
/// Rows may stop short of the header (trailing cells count as empty), but a
/// row with more cells than the header is malformed.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<AgentPayload>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .context("Failed to read CSV header")?
        .clone();

    let mut agents = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        // Header is line 1.
        let row_num = index + 2;
        let mut record = record.with_context(|| format!("Failed to parse CSV row {}", row_num))?;
        if record.len() > headers.len() {
            bail!(
                "Failed to parse CSV row {}: found {} fields, but the header has {}",
                row_num,
                record.len(),
                headers.len()
            );
        }
        while record.len() < headers.len() {
            record.push_field("");
        }

        let row: BatchRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Failed to parse CSV row {}", row_num))?;
        match row.into_payload() {
            Some(payload) => agents.push(payload),
            None => debug!(row = row_num, "Skipping row without prompt or response"),
        }
    }

    Ok(agents)
}

/// Read and parse a batch file from disk
pub fn read_batch_file(path: &Path) -> Result<Vec<AgentPayload>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open batch file: {}", path.display()))?;
    parse_rows(file).with_context(|| format!("Failed to parse batch file: {}", path.display()))
}

/// Turns a batch file into one aggregate scoring request
///
/// Unlike single-item dispatch there is no per-row isolation: the service
/// ranks all agents together, so any failure fails the whole batch.
pub struct BatchPipeline<'a, S> {
    service: &'a S,
}

impl<'a, S: ScoringService> BatchPipeline<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Parse `path` and score every accepted row in one request
    pub async fn ingest(&self, path: &Path) -> Result<BatchResult> {
        let agents = read_batch_file(path)?;
        self.submit(agents).await
    }

    /// Send already-parsed agents as one batch
    pub async fn submit(&self, agents: Vec<AgentPayload>) -> Result<BatchResult> {
        let submitted = agents.len();
        info!(agents = submitted, "Submitting batch evaluation");

        let request = BatchRequest { agents };
        let result = self
            .service
            .evaluate_batch(&request)
            .await
            .context("Batch evaluation failed")?;

        info!(submitted, ranked = result.leaderboard.len(), "Batch evaluation complete");
        Ok(result)
    }
}
