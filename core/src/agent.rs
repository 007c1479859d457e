//! The conversation/agent loop.
//!
//! Owns a growing transcript, requests model turns, dispatches tool calls
//! through the agent's registry, and feeds results back until a completion
//! signal, the iteration ceiling, or a transport failure.

use crate::errors::AgentResult;
use crate::tools::{ToolOutcome, ToolRegistry};
use crate::traits::{ContentBlock, Message, MessageRole, ModelBackend, ModelRequest};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-agent loop configuration.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Maximum loop passes before forced non-success termination.
    pub max_iterations: u32,
    /// The designated completion tool, if this agent has one.
    pub completion_tool: Option<String>,
    /// Whether a turn with no tool calls ends the run as a final answer.
    /// Agents with explicit-only completion set this to false.
    pub accept_final_text: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The completion tool signaled completion.
    Completed,
    /// The model produced a final text turn (no tool calls).
    FinalAnswer,
    /// The iteration ceiling was reached without completion.
    MaxIterationsReached,
}

/// Result of one agent run. Produced exactly once.
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    pub success: bool,
    pub iterations: u32,
    /// Terminal payload from the completion tool, if any.
    pub payload: Option<Value>,
    /// Final free-text answer, when the run ended on one.
    pub final_text: Option<String>,
    pub outcome: RunOutcome,
}

/// The generic agent loop. Specialized agents are thin configurations of
/// this: a tool registry, a system prompt, and an initial user turn.
pub struct AgentLoop {
    backend: Arc<dyn ModelBackend>,
    registry: ToolRegistry,
    system_prompt: String,
    model: String,
    max_tokens: usize,
    options: AgentOptions,
}

impl AgentLoop {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        registry: ToolRegistry,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
        max_tokens: usize,
        options: AgentOptions,
    ) -> Self {
        Self {
            backend,
            registry,
            system_prompt: system_prompt.into(),
            model: model.into(),
            max_tokens,
            options,
        }
    }

    /// Run the loop to termination. The transcript lives and dies with this
    /// call; only the result survives.
    ///
    /// Tool-level failures are recovered and surfaced to the model as data.
    /// The only error that escapes is a model transport failure.
    pub async fn run(&self, initial_prompt: &str) -> AgentResult<AgentRunResult> {
        let mut messages = vec![Message::user_text(initial_prompt)];
        let mut iterations: u32 = 0;

        info!(
            backend = self.backend.name(),
            max_iterations = self.options.max_iterations,
            "starting agent run"
        );

        loop {
            if iterations >= self.options.max_iterations {
                warn!(iterations, "iteration ceiling reached without completion");
                return Ok(AgentRunResult {
                    success: false,
                    iterations,
                    payload: None,
                    final_text: None,
                    outcome: RunOutcome::MaxIterationsReached,
                });
            }

            let request = ModelRequest {
                messages: messages.clone(),
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                system_prompt: Some(self.system_prompt.clone()),
                tools: Some(self.registry.specs()),
            };
            let response = self.backend.complete(request).await?;

            messages.push(Message {
                role: MessageRole::Assistant,
                content: response.content.clone(),
            });
            iterations += 1;

            let calls = response.tool_calls();
            if calls.is_empty() {
                if self.options.accept_final_text {
                    info!(iterations, "run finished on final text turn");
                    return Ok(AgentRunResult {
                        success: true,
                        iterations,
                        payload: None,
                        final_text: Some(response.text()),
                        outcome: RunOutcome::FinalAnswer,
                    });
                }
                // Explicit-only completion: nudge and keep looping. The
                // extra user turn keeps the transcript alternating on the
                // wire and counts against the ceiling.
                debug!(iterations, "bare text turn; nudging toward completion tool");
                messages.push(Message::user_text(
                    "Continue with the task. When you are finished, use the designated \
                     completion tool to end the run.",
                ));
                continue;
            }

            // Execute every call in block order and collect exactly one
            // result per call before the next model turn.
            let mut result_blocks = Vec::with_capacity(calls.len());
            let mut terminal: Option<Value> = None;
            for call in &calls {
                let outcome = self.registry.execute(&call.name, &call.arguments).await;
                if outcome.is_failure() {
                    debug!(tool = %call.name, "tool call failed; result fed back to model");
                }
                if let ToolOutcome::Complete(payload) = &outcome {
                    if self.options.completion_tool.as_deref() == Some(call.name.as_str()) {
                        terminal = Some(payload.clone());
                    }
                }
                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: outcome.render(),
                    is_error: outcome.is_failure(),
                });
            }
            messages.push(Message {
                role: MessageRole::User,
                content: result_blocks,
            });

            if let Some(payload) = terminal {
                info!(iterations, "completion tool signaled; run finished");
                return Ok(AgentRunResult {
                    success: true,
                    iterations,
                    payload: Some(payload),
                    final_text: None,
                    outcome: RunOutcome::Completed,
                });
            }
        }
    }
}
