/// Configuration management for the Mimic orchestration system.
/// Handles loading and validating ~/.mimic/config.toml.
use crate::errors::{AgentError, AgentResult};
use crate::validation::PipelineSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Top-level configuration structure for Mimic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MimicConfig {
    /// Model provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Per-agent iteration ceilings.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Validation pipeline settings.
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Default for MimicConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            agents: AgentsConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

/// Anthropic provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (can be read from env: ANTHROPIC_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model to use for all agents
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Max tokens per model turn
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_max_tokens() -> usize {
    8192
}

/// Iteration ceilings per agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Exploration is open-ended and gets a generous ceiling.
    #[serde(default = "default_exploration_iterations")]
    pub exploration_max_iterations: u32,

    /// Specification synthesis is a single distillation step.
    #[serde(default = "default_specification_iterations")]
    pub specification_max_iterations: u32,

    /// Generation needs room for several validation/repair cycles.
    #[serde(default = "default_generation_iterations")]
    pub generation_max_iterations: u32,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            exploration_max_iterations: default_exploration_iterations(),
            specification_max_iterations: default_specification_iterations(),
            generation_max_iterations: default_generation_iterations(),
        }
    }
}

fn default_exploration_iterations() -> u32 {
    100
}

fn default_specification_iterations() -> u32 {
    10
}

fn default_generation_iterations() -> u32 {
    50
}

/// Validation pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Install phase command
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,

    /// Build phase command
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,

    /// Dev server command
    #[serde(default = "default_dev_command")]
    pub dev_command: Vec<String>,

    /// Install phase timeout in seconds
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,

    /// Build phase timeout in seconds
    #[serde(default = "default_build_timeout")]
    pub build_timeout_secs: u64,

    /// Dev server warm-up interval in seconds
    #[serde(default = "default_warmup")]
    pub warmup_secs: u64,

    /// Grace window before SIGKILL during teardown, in seconds
    #[serde(default = "default_grace")]
    pub grace_secs: u64,

    /// Health endpoint probed after warm-up
    #[serde(default = "default_health_url")]
    pub health_url: String,

    /// Health probe timeout in seconds
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            install_command: default_install_command(),
            build_command: default_build_command(),
            dev_command: default_dev_command(),
            install_timeout_secs: default_install_timeout(),
            build_timeout_secs: default_build_timeout(),
            warmup_secs: default_warmup(),
            grace_secs: default_grace(),
            health_url: default_health_url(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

fn default_install_command() -> Vec<String> {
    vec!["npm".to_string(), "install".to_string()]
}

fn default_build_command() -> Vec<String> {
    vec!["npm".to_string(), "run".to_string(), "build".to_string()]
}

fn default_dev_command() -> Vec<String> {
    vec!["npm".to_string(), "run".to_string(), "dev".to_string()]
}

fn default_install_timeout() -> u64 {
    180
}

fn default_build_timeout() -> u64 {
    120
}

fn default_warmup() -> u64 {
    3
}

fn default_grace() -> u64 {
    5
}

fn default_health_url() -> String {
    "http://localhost:3000/health".to_string()
}

fn default_health_timeout() -> u64 {
    10
}

impl ValidationConfig {
    /// Materialize pipeline settings from this configuration.
    pub fn to_settings(&self) -> PipelineSettings {
        PipelineSettings {
            install_command: self.install_command.clone(),
            build_command: self.build_command.clone(),
            dev_command: self.dev_command.clone(),
            install_timeout: Duration::from_secs(self.install_timeout_secs),
            build_timeout: Duration::from_secs(self.build_timeout_secs),
            warmup: Duration::from_secs(self.warmup_secs),
            grace: Duration::from_secs(self.grace_secs),
            health_url: self.health_url.clone(),
            health_timeout: Duration::from_secs(self.health_timeout_secs),
        }
    }
}

impl MimicConfig {
    /// Load configuration from an explicit path or ~/.mimic/config.toml,
    /// falling back to defaults when no file exists. Environment overrides
    /// are applied last.
    pub fn load(config_path: Option<&Path>) -> AgentResult<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        let mut config = if path.exists() {
            info!("Loading config from {:?}", path);
            let content = std::fs::read_to_string(&path).map_err(|e| {
                AgentError::ExecutionError(format!("Failed to read config file: {}", e))
            })?;
            toml::from_str(&content).map_err(|e| {
                AgentError::ExecutionError(format!("Failed to parse config file: {}", e))
            })?
        } else {
            warn!("Config file not found at {:?}, using defaults", path);
            MimicConfig::default()
        };

        config.load_from_env();
        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Apply environment overrides.
    pub fn load_from_env(&mut self) {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.provider.api_key = Some(key);
        }
    }

    /// Validate configuration before a run.
    pub fn validate(&self) -> AgentResult<()> {
        if self.provider.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(AgentError::ExecutionError(
                "No API key configured: set ANTHROPIC_API_KEY or provider.api_key".to_string(),
            ));
        }
        if self.agents.exploration_max_iterations == 0
            || self.agents.specification_max_iterations == 0
            || self.agents.generation_max_iterations == 0
        {
            return Err(AgentError::ExecutionError(
                "Iteration ceilings must be greater than 0".to_string(),
            ));
        }
        debug!("Configuration validation passed");
        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".mimic/config.toml"),
        None => PathBuf::from(".mimic/config.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MimicConfig::default();
        assert_eq!(config.provider.endpoint, "https://api.anthropic.com/v1");
        assert_eq!(config.agents.exploration_max_iterations, 100);
        assert_eq!(config.agents.specification_max_iterations, 10);
        assert_eq!(config.agents.generation_max_iterations, 50);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: MimicConfig = toml::from_str(
            r#"
            [provider]
            model = "claude-3-haiku-20240307"

            [agents]
            generation_max_iterations = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.model, "claude-3-haiku-20240307");
        assert_eq!(config.provider.timeout_secs, 120);
        assert_eq!(config.agents.generation_max_iterations, 25);
        assert_eq!(config.agents.exploration_max_iterations, 100);
        assert_eq!(config.validation.install_command, vec!["npm", "install"]);
    }

    #[test]
    fn test_validation_requires_api_key() {
        let mut config = MimicConfig::default();
        config.provider.api_key = None;
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            // Environment already supplies a key; nothing to assert here.
            return;
        }
        assert!(config.validate().is_err());

        config.provider.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pipeline_settings_conversion() {
        let config = ValidationConfig::default();
        let settings = config.to_settings();
        assert_eq!(settings.install_command, vec!["npm", "install"]);
        assert_eq!(settings.warmup, Duration::from_secs(3));
        assert_eq!(settings.health_url, "http://localhost:3000/health");
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let mut config = MimicConfig::default();
        config.provider.api_key = Some("sk-test".to_string());
        config.agents.specification_max_iterations = 0;
        assert!(config.validate().is_err());
    }
}
