/// Error types for the Mimic agent orchestration system.
use thiserror::Error;

/// Core error type for model provider operations.
///
/// A failure here means no further model turns can be produced, so this is
/// the one error class that terminates an agent run instead of being fed
/// back to the model as data.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Core error type for agent runs.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent execution error: {0}")]
    ExecutionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
