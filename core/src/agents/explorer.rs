//! Exploration agent: probes an unknown HTTP API and records what it
//! learns until it signals completion.

use super::Observation;
use crate::agent::{AgentLoop, AgentOptions, AgentRunResult};
use crate::errors::AgentResult;
use crate::probe::HttpProbe;
use crate::prompts::{exploration_prompt, EXPLORATION_SYSTEM_PROMPT};
use crate::tools::definitions::{
    complete_exploration_tool, make_http_request_tool, record_observation_tool,
};
use crate::tools::{ToolHandler, ToolOutcome, ToolRegistry};
use crate::traits::ModelBackend;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// What an exploration run produced.
#[derive(Debug, Clone)]
pub struct ExplorationReport {
    pub success: bool,
    pub iterations: u32,
    pub summary: String,
    pub observations: Vec<Observation>,
}

/// Agent that explores a target API to understand its structure.
pub struct ExplorationAgent {
    agent: AgentLoop,
    target_url: String,
    observations: Arc<Mutex<Vec<Observation>>>,
}

impl ExplorationAgent {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        target_url: &str,
        model: &str,
        max_tokens: usize,
        max_iterations: u32,
    ) -> AgentResult<Self> {
        let probe = Arc::new(HttpProbe::new(target_url)?);
        let observations = Arc::new(Mutex::new(Vec::new()));

        let mut registry = ToolRegistry::new();
        registry.register(make_http_request_tool(), HttpRequestHandler { probe });
        registry.register(
            record_observation_tool(),
            RecordObservationHandler {
                observations: Arc::clone(&observations),
            },
        );
        registry.register(
            complete_exploration_tool(),
            CompleteExplorationHandler {
                observations: Arc::clone(&observations),
            },
        );

        let agent = AgentLoop::new(
            backend,
            registry,
            EXPLORATION_SYSTEM_PROMPT,
            model,
            max_tokens,
            AgentOptions {
                max_iterations,
                completion_tool: Some("complete_exploration".to_string()),
                accept_final_text: false,
            },
        );

        Ok(Self {
            agent,
            target_url: target_url.to_string(),
            observations,
        })
    }

    /// Explore the target API to termination.
    pub async fn explore(&self) -> AgentResult<ExplorationReport> {
        info!(target = %self.target_url, "starting exploration");
        let result = self.agent.run(&exploration_prompt(&self.target_url)).await?;
        Ok(self.report_from(result).await)
    }

    async fn report_from(&self, result: AgentRunResult) -> ExplorationReport {
        let summary = result
            .payload
            .as_ref()
            .and_then(|p| p.get("summary"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let observations = self.observations.lock().await.clone();
        info!(
            success = result.success,
            iterations = result.iterations,
            observations = observations.len(),
            "exploration finished"
        );
        ExplorationReport {
            success: result.success,
            iterations: result.iterations,
            summary,
            observations,
        }
    }
}

struct HttpRequestHandler {
    probe: Arc<HttpProbe>,
}

#[async_trait]
impl ToolHandler for HttpRequestHandler {
    async fn call(&self, args: &Value) -> ToolOutcome {
        let method = args.get("method").and_then(Value::as_str).unwrap_or("GET");
        let path = args.get("path").and_then(Value::as_str).unwrap_or("/");
        let headers = args.get("headers").and_then(Value::as_object);
        let body = args.get("body");
        ToolOutcome::Success(self.probe.request(method, path, headers, body).await)
    }
}

struct RecordObservationHandler {
    observations: Arc<Mutex<Vec<Observation>>>,
}

#[async_trait]
impl ToolHandler for RecordObservationHandler {
    async fn call(&self, args: &Value) -> ToolOutcome {
        let observation = args
            .get("observation")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let category = args
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("general")
            .to_string();

        self.observations.lock().await.push(Observation {
            category,
            observation,
        });

        ToolOutcome::Success(json!({
            "success": true,
            "message": "Observation recorded",
        }))
    }
}

struct CompleteExplorationHandler {
    observations: Arc<Mutex<Vec<Observation>>>,
}

#[async_trait]
impl ToolHandler for CompleteExplorationHandler {
    async fn call(&self, args: &Value) -> ToolOutcome {
        let summary = args.get("summary").and_then(Value::as_str).unwrap_or("");
        let observations = self.observations.lock().await.clone();
        ToolOutcome::Complete(json!({
            "complete": true,
            "summary": summary,
            "observations": observations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderResult;
    use crate::traits::{ContentBlock, ModelRequest, ModelResponse, StopReason};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    struct Script {
        turns: StdMutex<VecDeque<ModelResponse>>,
    }

    #[async_trait]
    impl ModelBackend for Script {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: ModelRequest) -> ProviderResult<ModelResponse> {
            Ok(self.turns.lock().unwrap().pop_front().unwrap())
        }
    }

    fn turn(blocks: Vec<ContentBlock>) -> ModelResponse {
        ModelResponse {
            content: blocks,
            stop_reason: StopReason::ToolUse,
        }
    }

    fn call(id: &str, name: &str, input: Value) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    #[tokio::test]
    async fn records_observations_and_completes_with_summary() {
        let backend = Arc::new(Script {
            turns: StdMutex::new(
                vec![
                    turn(vec![call(
                        "c1",
                        "record_observation",
                        json!({"observation": "GET /api/books lists books", "category": "endpoint"}),
                    )]),
                    turn(vec![call(
                        "c2",
                        "complete_exploration",
                        json!({"summary": "one resource, books"}),
                    )]),
                ]
                .into(),
            ),
        });

        let agent =
            ExplorationAgent::new(backend, "http://localhost:3000", "test-model", 1024, 10)
                .unwrap();
        let report = agent.explore().await.unwrap();

        assert!(report.success);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.summary, "one resource, books");
        assert_eq!(report.observations.len(), 1);
        assert_eq!(report.observations[0].category, "endpoint");
    }

    #[tokio::test]
    async fn probe_failures_do_not_touch_the_observation_log() {
        // Nothing listens on port 1; the probe result is structured data
        // and the log stays empty until record_observation is called.
        let backend = Arc::new(Script {
            turns: StdMutex::new(
                vec![
                    turn(vec![call(
                        "c1",
                        "make_http_request",
                        json!({"method": "GET", "path": "/missing"}),
                    )]),
                    turn(vec![call("c2", "complete_exploration", json!({"summary": "s"}))]),
                ]
                .into(),
            ),
        });

        let agent = ExplorationAgent::new(backend, "http://127.0.0.1:1", "test-model", 1024, 10)
            .unwrap();
        let report = agent.explore().await.unwrap();
        assert!(report.success);
        assert!(report.observations.is_empty());
    }
}
