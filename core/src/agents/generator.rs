//! Code-generation agent: writes the generated project to disk, seeds
//! its database, and runs the validation pipeline until the model signals
//! completion.

use crate::agent::{AgentLoop, AgentOptions};
use crate::errors::AgentResult;
use crate::prompts::{generation_prompt, GENERATION_SYSTEM_PROMPT};
use crate::seed::create_seed_database;
use crate::tools::definitions::{
    complete_generation_tool, create_seed_database_tool, run_validation_tool, write_file_tool,
};
use crate::tools::{ToolHandler, ToolOutcome, ToolRegistry};
use crate::traits::ModelBackend;
use crate::validation::{PipelineSettings, ValidationPipeline};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// What a generation run produced.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub success: bool,
    pub iterations: u32,
    pub summary: String,
    pub generated_files: Vec<String>,
    pub output_dir: PathBuf,
}

/// Agent that generates a server environment from a specification.
pub struct GenerationAgent {
    agent: AgentLoop,
    output_dir: PathBuf,
    manifest: Arc<Mutex<Vec<String>>>,
}

impl GenerationAgent {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        output_dir: impl Into<PathBuf>,
        pipeline_settings: PipelineSettings,
        model: &str,
        max_tokens: usize,
        max_iterations: u32,
    ) -> Self {
        let output_dir = output_dir.into();
        let manifest = Arc::new(Mutex::new(Vec::new()));

        let mut registry = ToolRegistry::new();
        registry.register(
            write_file_tool(),
            WriteFileHandler {
                output_dir: output_dir.clone(),
                manifest: Arc::clone(&manifest),
            },
        );
        registry.register(
            create_seed_database_tool(),
            CreateSeedDatabaseHandler {
                output_dir: output_dir.clone(),
            },
        );
        registry.register(
            run_validation_tool(),
            RunValidationHandler {
                output_dir: output_dir.clone(),
                settings: pipeline_settings,
            },
        );
        registry.register(
            complete_generation_tool(),
            CompleteGenerationHandler {
                manifest: Arc::clone(&manifest),
            },
        );

        let agent = AgentLoop::new(
            backend,
            registry,
            GENERATION_SYSTEM_PROMPT,
            model,
            max_tokens,
            AgentOptions {
                max_iterations,
                completion_tool: Some("complete_generation".to_string()),
                accept_final_text: false,
            },
        );

        Self {
            agent,
            output_dir,
            manifest,
        }
    }

    /// Generate the project from a specification, to termination.
    pub async fn generate(&self, specification: &Value) -> AgentResult<GenerationReport> {
        info!(output = %self.output_dir.display(), "starting code generation");
        let result = self.agent.run(&generation_prompt(specification)).await?;

        let summary = result
            .payload
            .as_ref()
            .and_then(|p| p.get("summary"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let generated_files = self.manifest.lock().await.clone();

        info!(
            success = result.success,
            iterations = result.iterations,
            files = generated_files.len(),
            "code generation finished"
        );
        Ok(GenerationReport {
            success: result.success,
            iterations: result.iterations,
            summary,
            generated_files,
            output_dir: self.output_dir.clone(),
        })
    }
}

/// Resolve a model-supplied relative path under the output directory.
/// Absolute paths and parent-directory components are refused.
fn resolve_output_path(output_dir: &Path, rel_path: &str) -> Result<PathBuf, String> {
    let rel = Path::new(rel_path);
    if rel.is_absolute() {
        return Err(format!("path must be relative: {rel_path}"));
    }
    if rel.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(format!("path may not escape the output directory: {rel_path}"));
    }
    Ok(output_dir.join(rel))
}

struct WriteFileHandler {
    output_dir: PathBuf,
    manifest: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ToolHandler for WriteFileHandler {
    async fn call(&self, args: &Value) -> ToolOutcome {
        let rel_path = match args.get("path").and_then(Value::as_str) {
            Some(p) if !p.is_empty() => p,
            _ => return ToolOutcome::Failure("write_file: missing path".into()),
        };
        let content = match args.get("content").and_then(Value::as_str) {
            Some(c) => c,
            None => return ToolOutcome::Failure("write_file: missing content".into()),
        };

        let full_path = match resolve_output_path(&self.output_dir, rel_path) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::Failure(format!("write_file: {e}")),
        };

        if let Some(parent) = full_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolOutcome::Failure(format!("write_file: {e}"));
            }
        }
        if let Err(e) = tokio::fs::write(&full_path, content).await {
            return ToolOutcome::Failure(format!("write_file: {e}"));
        }

        // Last write wins; a rewritten path is listed once.
        let mut manifest = self.manifest.lock().await;
        if !manifest.iter().any(|p| p == rel_path) {
            manifest.push(rel_path.to_string());
        }

        ToolOutcome::Success(json!({
            "success": true,
            "message": format!("File written: {rel_path}"),
            "path": full_path.display().to_string(),
        }))
    }
}

struct CreateSeedDatabaseHandler {
    output_dir: PathBuf,
}

#[async_trait]
impl ToolHandler for CreateSeedDatabaseHandler {
    async fn call(&self, args: &Value) -> ToolOutcome {
        let schema_rel = match args.get("schema_path").and_then(Value::as_str) {
            Some(p) => p,
            None => return ToolOutcome::Failure("create_seed_database: missing schema_path".into()),
        };
        let output_rel = match args.get("output_path").and_then(Value::as_str) {
            Some(p) => p,
            None => return ToolOutcome::Failure("create_seed_database: missing output_path".into()),
        };

        let schema_path = match resolve_output_path(&self.output_dir, schema_rel) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::Failure(format!("create_seed_database: {e}")),
        };
        let db_path = match resolve_output_path(&self.output_dir, output_rel) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::Failure(format!("create_seed_database: {e}")),
        };

        match create_seed_database(&schema_path, &db_path).await {
            Ok(()) => ToolOutcome::Success(json!({
                "success": true,
                "message": format!("Database created: {output_rel}"),
            })),
            Err(e) => ToolOutcome::Failure(format!("create_seed_database: {e}")),
        }
    }
}

struct RunValidationHandler {
    output_dir: PathBuf,
    settings: PipelineSettings,
}

#[async_trait]
impl ToolHandler for RunValidationHandler {
    async fn call(&self, _args: &Value) -> ToolOutcome {
        let pipeline = ValidationPipeline::new(&self.output_dir, self.settings.clone());
        let report = pipeline.run().await;
        // Phase failures are repair input for the model, not tool errors.
        ToolOutcome::Success(report.to_value())
    }
}

struct CompleteGenerationHandler {
    manifest: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ToolHandler for CompleteGenerationHandler {
    async fn call(&self, args: &Value) -> ToolOutcome {
        let summary = args.get("summary").and_then(Value::as_str).unwrap_or("");
        let generated_files = self.manifest.lock().await.clone();
        ToolOutcome::Complete(json!({
            "complete": true,
            "summary": summary,
            "generated_files": generated_files,
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
    use std::time::Duration;
    use tempfile::TempDir;

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

    fn turn(calls: Vec<(&str, &str, Value)>) -> ModelResponse {
        ModelResponse {
            content: calls
                .into_iter()
                .map(|(id, name, input)| ContentBlock::ToolUse {
                    id: id.into(),
                    name: name.into(),
                    input,
                })
                .collect(),
            stop_reason: StopReason::ToolUse,
        }
    }

    fn test_settings() -> PipelineSettings {
        PipelineSettings {
            install_command: vec!["true".into()],
            build_command: vec!["true".into()],
            dev_command: vec!["sh".into(), "-c".into(), "exit 1".into()],
            install_timeout: Duration::from_secs(5),
            build_timeout: Duration::from_secs(5),
            warmup: Duration::from_millis(100),
            grace: Duration::from_secs(1),
            health_url: "http://127.0.0.1:1/health".into(),
            health_timeout: Duration::from_secs(1),
        }
    }

    fn agent_with(turns: Vec<ModelResponse>, dir: &TempDir) -> GenerationAgent {
        GenerationAgent::new(
            Arc::new(Script {
                turns: StdMutex::new(turns.into()),
            }),
            dir.path(),
            test_settings(),
            "test-model",
            1024,
            20,
        )
    }

    #[tokio::test]
    async fn write_file_is_idempotent_by_path() {
        let dir = TempDir::new().unwrap();
        let agent = agent_with(
            vec![
                turn(vec![(
                    "c1",
                    "write_file",
                    json!({"path": "src/index.ts", "content": "first"}),
                )]),
                turn(vec![(
                    "c2",
                    "write_file",
                    json!({"path": "src/index.ts", "content": "second"}),
                )]),
                turn(vec![("c3", "complete_generation", json!({"summary": "done"}))]),
            ],
            &dir,
        );

        let report = agent.generate(&json!({"api_name": "x"})).await.unwrap();
        assert!(report.success);
        // Last write wins on disk, single manifest entry.
        let content = std::fs::read_to_string(dir.path().join("src/index.ts")).unwrap();
        assert_eq!(content, "second");
        assert_eq!(report.generated_files, vec!["src/index.ts"]);
    }

    #[tokio::test]
    async fn escaping_paths_are_refused() {
        let dir = TempDir::new().unwrap();
        let agent = agent_with(
            vec![
                turn(vec![(
                    "c1",
                    "write_file",
                    json!({"path": "../outside.txt", "content": "x"}),
                )]),
                turn(vec![("c2", "complete_generation", json!({"summary": "done"}))]),
            ],
            &dir,
        );

        let report = agent.generate(&json!({})).await.unwrap();
        assert!(report.success);
        assert!(report.generated_files.is_empty());
        assert!(!dir.path().parent().unwrap().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn seed_database_is_built_from_generated_schema() {
        let dir = TempDir::new().unwrap();
        let agent = agent_with(
            vec![
                turn(vec![(
                    "c1",
                    "write_file",
                    json!({
                        "path": "data/schema.sql",
                        "content": "CREATE TABLE books (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL);",
                    }),
                )]),
                turn(vec![(
                    "c2",
                    "create_seed_database",
                    json!({"schema_path": "data/schema.sql", "output_path": "data/seed.db"}),
                )]),
                turn(vec![("c3", "complete_generation", json!({"summary": "done"}))]),
            ],
            &dir,
        );

        let report = agent.generate(&json!({})).await.unwrap();
        assert!(report.success);
        assert!(dir.path().join("data/seed.db").exists());
    }

    #[tokio::test]
    async fn validation_failure_feeds_back_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let agent = agent_with(
            vec![
                turn(vec![("c1", "run_validation", json!({}))]),
                turn(vec![("c2", "complete_generation", json!({"summary": "gave up"}))]),
            ],
            &dir,
        );

        // The dev command exits immediately, so validation reports a dev
        // failure; the run itself keeps going.
        let report = agent.generate(&json!({})).await.unwrap();
        assert!(report.success);
        assert_eq!(report.iterations, 2);
    }

    #[tokio::test]
    async fn completion_summary_is_carried_verbatim() {
        let dir = TempDir::new().unwrap();
        let agent = agent_with(
            vec![turn(vec![(
                "c1",
                "complete_generation",
                json!({"summary": "done"}),
            )])],
            &dir,
        );
        let report = agent.generate(&json!({})).await.unwrap();
        assert!(report.success);
        assert_eq!(report.summary, "done");
    }
}
