//! Tool registry and execution for Mimic agents.
//!
//! Each agent builds its own registry at construction time; there is no
//! ambient dispatch table, so concurrent agents cannot interfere.

pub mod definitions;

use crate::traits::Tool;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Outcome of executing one tool call. Handler failures are data, never
/// propagating errors: the loop feeds them back to the model so it can
/// repair on its next turn.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// Structured payload for the model.
    Success(Value),
    /// Human-readable failure message (unknown tool, handler error).
    Failure(String),
    /// Completion signal carrying the terminal payload.
    Complete(Value),
}

impl ToolOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }

    /// Render the payload as the string content of a tool_result block.
    pub fn render(&self) -> String {
        match self {
            ToolOutcome::Success(v) | ToolOutcome::Complete(v) => v.to_string(),
            ToolOutcome::Failure(msg) => msg.clone(),
        }
    }
}

/// A registered tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: &Value) -> ToolOutcome;
}

struct Registered {
    spec: Tool,
    handler: Box<dyn ToolHandler>,
}

/// Name → handler mapping owned by one agent.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Registered>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a tool spec with its handler. Later registrations with the
    /// same name shadow earlier ones (first match wins on execute, so
    /// construction should not repeat names; agents never do).
    pub fn register(&mut self, spec: Tool, handler: impl ToolHandler + 'static) {
        self.entries.push(Registered {
            spec,
            handler: Box::new(handler),
        });
    }

    /// The tool specs advertised to the model, in registration order.
    pub fn specs(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.spec.name == name)
    }

    /// Execute a tool by name. An unregistered name yields a Failure
    /// outcome naming the offender; it never terminates the run.
    pub async fn execute(&self, name: &str, args: &Value) -> ToolOutcome {
        match self.entries.iter().find(|e| e.spec.name == name) {
            Some(entry) => {
                debug!(tool = name, "executing tool");
                entry.handler.call(args).await
            }
            None => ToolOutcome::Failure(format!("unknown tool: {name}")),
        }
    }
}
