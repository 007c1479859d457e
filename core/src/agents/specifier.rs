//! Specification agent: distills exploration observations into a
//! structured API specification.

use super::Observation;
use crate::agent::{AgentLoop, AgentOptions};
use crate::errors::AgentResult;
use crate::prompts::{specification_prompt, SPECIFICATION_SYSTEM_PROMPT};
use crate::tools::definitions::output_specification_tool;
use crate::tools::{ToolHandler, ToolOutcome, ToolRegistry};
use crate::traits::ModelBackend;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Outcome of a specification run. The specification is kept verbatim as
/// the model produced it; no shape validation is applied.
#[derive(Debug, Clone)]
pub struct SpecificationResult {
    pub success: bool,
    pub iterations: u32,
    pub specification: Option<Value>,
}

/// Agent that synthesizes observations into a specification.
pub struct SpecificationAgent {
    agent: AgentLoop,
    captured: Arc<Mutex<Option<Value>>>,
}

impl SpecificationAgent {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        model: &str,
        max_tokens: usize,
        max_iterations: u32,
    ) -> Self {
        let captured = Arc::new(Mutex::new(None));

        let mut registry = ToolRegistry::new();
        registry.register(
            output_specification_tool(),
            OutputSpecificationHandler {
                captured: Arc::clone(&captured),
            },
        );

        let agent = AgentLoop::new(
            backend,
            registry,
            SPECIFICATION_SYSTEM_PROMPT,
            model,
            max_tokens,
            AgentOptions {
                max_iterations,
                completion_tool: Some("output_specification".to_string()),
                accept_final_text: false,
            },
        );

        Self { agent, captured }
    }

    /// Generate a specification from the exploration observations.
    pub async fn generate(
        &self,
        target_url: &str,
        observations: &[Observation],
    ) -> AgentResult<SpecificationResult> {
        info!(observations = observations.len(), "starting specification synthesis");
        let result = self
            .agent
            .run(&specification_prompt(target_url, observations))
            .await?;
        let specification = self.captured.lock().await.clone();

        info!(
            success = result.success,
            iterations = result.iterations,
            captured = specification.is_some(),
            "specification synthesis finished"
        );
        Ok(SpecificationResult {
            success: result.success && specification.is_some(),
            iterations: result.iterations,
            specification,
        })
    }
}

struct OutputSpecificationHandler {
    captured: Arc<Mutex<Option<Value>>>,
}

#[async_trait]
impl ToolHandler for OutputSpecificationHandler {
    async fn call(&self, args: &Value) -> ToolOutcome {
        let specification = match args.get("specification") {
            Some(spec) => spec.clone(),
            None => return ToolOutcome::Failure("output_specification: missing specification".into()),
        };
        *self.captured.lock().await = Some(specification);
        ToolOutcome::Complete(json!({
            "complete": true,
            "message": "Specification generated successfully",
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
        seen: StdMutex<Vec<ModelRequest>>,
    }

    #[async_trait]
    impl ModelBackend for Script {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ModelRequest) -> ProviderResult<ModelResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(self.turns.lock().unwrap().pop_front().unwrap())
        }
    }

    #[tokio::test]
    async fn captures_specification_verbatim() {
        let spec = json!({
            "api_name": "bookstore",
            "endpoints": [{"method": "GET", "path": "/api/books"}],
        });
        let backend = Arc::new(Script {
            turns: StdMutex::new(
                vec![ModelResponse {
                    content: vec![ContentBlock::ToolUse {
                        id: "c1".into(),
                        name: "output_specification".into(),
                        input: json!({"specification": spec}),
                    }],
                    stop_reason: StopReason::ToolUse,
                }]
                .into(),
            ),
            seen: StdMutex::new(Vec::new()),
        });

        let agent = SpecificationAgent::new(backend.clone(), "test-model", 1024, 10);
        let observations = vec![Observation {
            category: "endpoint".into(),
            observation: "GET /api/books".into(),
        }];
        let result = agent
            .generate("http://localhost:3000", &observations)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.specification.unwrap(), spec);

        // The initial prompt carried the tagged observation lines.
        let seen = backend.seen.lock().unwrap();
        assert!(seen[0].messages[0].text().contains("[endpoint] GET /api/books"));
    }

    #[tokio::test]
    async fn missing_specification_argument_is_a_tool_failure() {
        let backend = Arc::new(Script {
            turns: StdMutex::new(
                vec![
                    ModelResponse {
                        content: vec![ContentBlock::ToolUse {
                            id: "c1".into(),
                            name: "output_specification".into(),
                            input: json!({}),
                        }],
                        stop_reason: StopReason::ToolUse,
                    },
                    ModelResponse {
                        content: vec![ContentBlock::ToolUse {
                            id: "c2".into(),
                            name: "output_specification".into(),
                            input: json!({"specification": {"api_name": "x"}}),
                        }],
                        stop_reason: StopReason::ToolUse,
                    },
                ]
                .into(),
            ),
            seen: StdMutex::new(Vec::new()),
        });

        let agent = SpecificationAgent::new(backend, "test-model", 1024, 10);
        let result = agent.generate("http://localhost:3000", &[]).await.unwrap();
        // First call failed as data, second succeeded.
        assert!(result.success);
        assert_eq!(result.iterations, 2);
    }
}
