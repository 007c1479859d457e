// Mimic: agent-driven API cloning system
// Core library providing the agent loop, tools, providers, and validation

pub mod agent;
pub mod agents;
pub mod config;
pub mod errors;
pub mod probe;
pub mod prompts;
pub mod provider;
pub mod seed;
pub mod tools;
pub mod traits;
pub mod validation;

// Re-export commonly used types
pub use errors::{AgentError, AgentResult, ProviderError, ProviderResult};

pub use traits::{
    ContentBlock, Message, MessageRole, ModelBackend, ModelRequest, ModelResponse, StopReason,
    Tool, ToolCall, ToolParameters,
};

pub use agent::{AgentLoop, AgentOptions, AgentRunResult, RunOutcome};

pub use agents::{
    ExplorationAgent, ExplorationReport, GenerationAgent, GenerationReport, Observation,
    SpecificationAgent, SpecificationResult,
};

pub use config::{AgentsConfig, MimicConfig, ProviderConfig, ValidationConfig};

pub use probe::HttpProbe;

pub use provider::AnthropicProvider;

pub use seed::create_seed_database;

pub use tools::{ToolHandler, ToolOutcome, ToolRegistry};

pub use validation::{Phase, PipelineSettings, ValidationPipeline, ValidationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
