use crate::client::ScoringService;
use crate::models::{AgentRecord, ErrorPayload, Evaluation, EvaluationResult, ResultsMap};
use anyhow::{Result, bail};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Settled outcome of one agent's scoring request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Scored { id: String, evaluation: Evaluation },
    Failed { id: String, error: ErrorPayload },
}

impl Outcome {
    pub fn id(&self) -> &str {
        match self {
            Outcome::Scored { id, .. } | Outcome::Failed { id, .. } => id,
        }
    }

    fn into_entry(self) -> (String, EvaluationResult) {
        match self {
            Outcome::Scored { id, evaluation } => (id, EvaluationResult::Scored(evaluation)),
            Outcome::Failed { id, error } => (id, EvaluationResult::Failed { error }),
        }
    }
}

/// Fans out one scoring request per agent and collects every outcome
///
/// Requests run concurrently on the calling task. A failed request is
/// recorded against its agent and never short-circuits the others.
pub struct Dispatcher<'a, S> {
    service: &'a S,
}

impl<'a, S: ScoringService> Dispatcher<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Evaluate every agent and key the outcomes by agent id
    ///
    /// Errors only when the snapshot itself is unusable (duplicate ids), in
    /// which case no request is sent.
    pub async fn evaluate(&self, agents: &[AgentRecord]) -> Result<ResultsMap> {
        Self::check_unique_ids(agents)?;

        let outcomes = self.gather(agents).await;
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Failed { .. }))
            .count();
        info!(total = outcomes.len(), failed, "Evaluation cycle complete");

        Ok(outcomes.into_iter().map(Outcome::into_entry).collect())
    }

    /// Issue all requests at once and wait for every one of them to settle
    pub async fn gather(&self, agents: &[AgentRecord]) -> Vec<Outcome> {
        let requests = agents.iter().map(|agent| self.evaluate_one(agent));
        join_all(requests).await
    }

    async fn evaluate_one(&self, agent: &AgentRecord) -> Outcome {
        let payload = agent.to_payload();
        debug!(
            agent_id = %agent.id,
            structured_metadata = payload.metadata.is_structured(),
            "Dispatching evaluation"
        );

        match self.service.evaluate(&payload).await {
            Ok(evaluation) => Outcome::Scored {
                id: agent.id.clone(),
                evaluation,
            },
            Err(e) => {
                warn!(agent_id = %agent.id, error = %e, "Evaluation failed");
                Outcome::Failed {
                    id: agent.id.clone(),
                    error: e.into_payload(),
                }
            }
        }
    }

    fn check_unique_ids(agents: &[AgentRecord]) -> Result<()> {
        let mut seen = HashSet::new();
        for agent in agents {
            if !seen.insert(agent.id.as_str()) {
                bail!("Duplicate agent id in roster: {}", agent.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ScoreError, ScoringClient};
    use crate::config::ServiceConfig;
    use crate::metadata::Metadata;
    use crate::models::{AgentPayload, BatchRequest, BatchResult};
    use crate::roster::{AgentField, Roster};
    use indexmap::IndexMap;
    use serde_json::json;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Scores by prompt; prompts starting with "fail" are rejected, "down"
    /// simulates an unreachable service, "slow" answers after a delay.
    struct FakeScorer {
        seen: RefCell<Vec<AgentPayload>>,
    }

    impl FakeScorer {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl ScoringService for FakeScorer {
        async fn evaluate(&self, payload: &AgentPayload) -> Result<Evaluation, ScoreError> {
            self.seen.borrow_mut().push(payload.clone());

            if payload.prompt.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if payload.prompt.starts_with("fail") {
                return Err(ScoreError::Rejected {
                    status: 422,
                    body: json!({"detail": "invalid prompt"}),
                });
            }
            if payload.prompt.starts_with("down") {
                return Err(ScoreError::Transport("connection refused".to_string()));
            }

            let mut scores = IndexMap::new();
            scores.insert("coherence".to_string(), payload.response.len() as f64 / 10.0);
            Ok(Evaluation {
                scores,
                details: IndexMap::new(),
                explanation: format!("scored {}", payload.prompt),
                extra: Default::default(),
            })
        }

        async fn evaluate_batch(&self, _request: &BatchRequest) -> Result<BatchResult, ScoreError> {
            unreachable!("dispatcher never sends batch requests")
        }
    }

    fn roster_with(prompts: &[&str]) -> Roster {
        prompts.iter().fold(Roster::new(), |roster, prompt| {
            let roster = roster.add();
            let index = roster.len() - 1;
            roster
                .update(index, AgentField::Prompt, *prompt)
                .update(index, AgentField::Response, "12345")
        })
    }

    #[tokio::test]
    async fn test_every_submitted_id_gets_one_entry() {
        let scorer = FakeScorer::new();
        let roster = roster_with(&["ok", "fail", "down", "slow ok", "fail again"]);

        let results = Dispatcher::new(&scorer)
            .evaluate(&roster.snapshot())
            .await
            .unwrap();

        let keys: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["Agent-1", "Agent-2", "Agent-3", "Agent-4", "Agent-5"]
        );
        assert_eq!(scorer.seen.borrow().len(), 5);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_agent() {
        let scorer = FakeScorer::new();
        let roster = roster_with(&["fail", "slow ok", "down"]);

        let results = Dispatcher::new(&scorer)
            .evaluate(&roster.snapshot())
            .await
            .unwrap();

        assert_eq!(
            results["Agent-1"],
            EvaluationResult::Failed {
                error: ErrorPayload::Service(json!({"detail": "invalid prompt"}))
            }
        );
        let scored = results["Agent-2"].evaluation().unwrap();
        assert_eq!(scored.scores.get("coherence"), Some(&0.5));
        assert_eq!(scored.explanation, "scored slow ok");
        match &results["Agent-3"] {
            EvaluationResult::Failed {
                error: ErrorPayload::Transport(message),
            } => assert!(message.contains("connection refused")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_requests_are_issued_concurrently() {
        let scorer = FakeScorer::new();
        let roster = roster_with(&["slow 1", "slow 2", "slow 3", "slow 4"]);

        let start = tokio::time::Instant::now();
        let results = Dispatcher::new(&scorer)
            .evaluate(&roster.snapshot())
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        // Sequential dispatch would take at least 200ms.
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_metadata_is_normalized_per_agent() {
        let scorer = FakeScorer::new();
        let roster = roster_with(&["a", "b", "c"])
            .update(0, AgentField::Metadata, r#"{"k": 1}"#)
            .update(1, AgentField::Metadata, "plain words");

        Dispatcher::new(&scorer)
            .evaluate(&roster.snapshot())
            .await
            .unwrap();

        let seen = scorer.seen.borrow();
        assert_eq!(seen[0].metadata, Metadata::Structured(json!({"k": 1})));
        assert_eq!(seen[1].metadata, Metadata::Raw("plain words".to_string()));
        assert_eq!(seen[2].metadata, Metadata::Raw(String::new()));
    }

    #[tokio::test]
    async fn test_empty_roster_yields_empty_map() {
        let scorer = FakeScorer::new();
        let results = Dispatcher::new(&scorer).evaluate(&[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_abort_before_sending() {
        let scorer = FakeScorer::new();
        let roster = roster_with(&["a", "b"]).update(1, AgentField::Id, "Agent-1");

        let err = Dispatcher::new(&scorer)
            .evaluate(&roster.snapshot())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Duplicate agent id"));
        assert!(scorer.seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_gather_returns_tagged_outcomes() {
        let scorer = FakeScorer::new();
        let roster = roster_with(&["ok", "fail"]);

        let outcomes = Dispatcher::new(&scorer).gather(&roster.snapshot()).await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(&outcomes[0], Outcome::Scored { id, .. } if id == "Agent-1"));
        assert!(matches!(&outcomes[1], Outcome::Failed { id, .. } if id == "Agent-2"));
        assert_eq!(outcomes[1].id(), "Agent-2");
    }

    #[tokio::test]
    async fn test_end_to_end_over_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/evaluate")
            .match_body(mockito::Matcher::Json(json!({
                "prompt": "P",
                "response": "R",
                "metadata": {"k": 1}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"scores": {"coherence": 0.8}, "details": {"coherence": {"score": 8, "justification": "ok"}}, "explanation": "good"}"#,
            )
            .create_async()
            .await;
        server
            .mock("POST", "/evaluate")
            .match_body(mockito::Matcher::PartialJson(json!({"prompt": "broken"})))
            .with_status(400)
            .with_body(r#"{"detail": "bad"}"#)
            .create_async()
            .await;

        let client = ScoringClient::new(&ServiceConfig {
            endpoint: server.url(),
            timeout_secs: 5,
        })
        .unwrap();
        let roster = Roster::new()
            .add()
            .update(0, AgentField::Prompt, "P")
            .update(0, AgentField::Response, "R")
            .update(0, AgentField::Metadata, r#"{"k":1}"#)
            .add()
            .update(1, AgentField::Prompt, "broken");

        let results = Dispatcher::new(&client)
            .evaluate(&roster.snapshot())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            serde_json::to_value(&results["Agent-1"]).unwrap(),
            json!({
                "scores": {"coherence": 0.8},
                "details": {"coherence": {"score": 8.0, "justification": "ok"}},
                "explanation": "good"
            })
        );
        assert_eq!(
            serde_json::to_value(&results["Agent-2"]).unwrap(),
            json!({"error": {"detail": "bad"}})
        );
    }
}
