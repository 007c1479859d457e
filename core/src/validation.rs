//! Phase-gated validation of a generated project.
//!
//! Three strictly sequential phases: install, build, then run the dev
//! server and probe its health endpoint. The first failure stops the
//! pipeline and is reported with its phase tag so the model can repair
//! the generated files and re-run. The dev server is always torn down
//! before the call returns, so no listening port leaks across repair
//! iterations.

use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Pipeline stage tags as they appear in failure payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Install,
    Build,
    Dev,
}

/// Outcome of one pipeline run. Failures carry the first failing phase
/// and the captured subprocess output.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub errors: String,
}

impl ValidationReport {
    fn passed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            phase: None,
            message: message.into(),
            stdout: String::new(),
            errors: String::new(),
        }
    }

    fn failed(phase: Phase, message: impl Into<String>, stdout: String, errors: String) -> Self {
        Self {
            success: false,
            phase: Some(phase),
            message: message.into(),
            stdout,
            errors,
        }
    }

    /// The JSON payload fed back to the model as a ToolResult.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({"success": self.success}))
    }
}

/// Commands and bounds for one pipeline run. Defaults target an npm
/// project; tests substitute shell one-liners.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub install_command: Vec<String>,
    pub build_command: Vec<String>,
    pub dev_command: Vec<String>,
    pub install_timeout: Duration,
    pub build_timeout: Duration,
    /// How long the dev server gets to come up before the liveness check.
    pub warmup: Duration,
    /// Grace window between SIGTERM and SIGKILL during teardown.
    pub grace: Duration,
    pub health_url: String,
    pub health_timeout: Duration,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            install_command: argv(&["npm", "install"]),
            build_command: argv(&["npm", "run", "build"]),
            dev_command: argv(&["npm", "run", "dev"]),
            install_timeout: Duration::from_secs(180),
            build_timeout: Duration::from_secs(120),
            warmup: Duration::from_secs(3),
            grace: Duration::from_secs(5),
            health_url: "http://localhost:3000/health".to_string(),
            health_timeout: Duration::from_secs(10),
        }
    }
}

/// Runs the install/build/dev pipeline against a project directory.
pub struct ValidationPipeline {
    project_dir: PathBuf,
    settings: PipelineSettings,
}

impl ValidationPipeline {
    pub fn new(project_dir: impl Into<PathBuf>, settings: PipelineSettings) -> Self {
        Self {
            project_dir: project_dir.into(),
            settings,
        }
    }

    /// Run all phases in order, stopping at the first failure. Never
    /// returns an error: every outcome is a report.
    pub async fn run(&self) -> ValidationReport {
        info!(dir = %self.project_dir.display(), "starting validation pipeline");

        if let Some(report) = self
            .run_step(
                Phase::Install,
                &self.settings.install_command,
                self.settings.install_timeout,
            )
            .await
        {
            return report;
        }
        if let Some(report) = self
            .run_step(
                Phase::Build,
                &self.settings.build_command,
                self.settings.build_timeout,
            )
            .await
        {
            return report;
        }
        self.run_dev_phase().await
    }

    /// Run one bounded foreground step. `None` means the phase passed.
    async fn run_step(
        &self,
        phase: Phase,
        command: &[String],
        bound: Duration,
    ) -> Option<ValidationReport> {
        debug!(?phase, ?command, "running pipeline step");
        let (program, args) = match command.split_first() {
            Some(split) => split,
            None => {
                return Some(ValidationReport::failed(
                    phase,
                    "empty command",
                    String::new(),
                    String::new(),
                ))
            }
        };

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            // If the bound elapses, dropping the output future must take
            // the child with it.
            .kill_on_drop(true)
            .output();

        let output = match timeout(bound, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Some(ValidationReport::failed(
                    phase,
                    format!("failed to launch {program}: {e}"),
                    String::new(),
                    String::new(),
                ))
            }
            Err(_) => {
                return Some(ValidationReport::failed(
                    phase,
                    format!("{program} timed out after {}s", bound.as_secs()),
                    String::new(),
                    String::new(),
                ))
            }
        };

        if output.status.success() {
            None
        } else {
            warn!(?phase, code = ?output.status.code(), "pipeline step failed");
            Some(ValidationReport::failed(
                phase,
                format!("{program} exited with {}", output.status),
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }

    /// Launch the dev server, verify liveness after warm-up, probe the
    /// health endpoint once, then tear the server down unconditionally.
    async fn run_dev_phase(&self) -> ValidationReport {
        let (program, args) = match self.settings.dev_command.split_first() {
            Some(split) => split,
            None => {
                return ValidationReport::failed(
                    Phase::Dev,
                    "empty command",
                    String::new(),
                    String::new(),
                )
            }
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so teardown catches any children npm spawns.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ValidationReport::failed(
                    Phase::Dev,
                    format!("failed to launch {program}: {e}"),
                    String::new(),
                    String::new(),
                )
            }
        };

        tokio::time::sleep(self.settings.warmup).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                // Died during warm-up; surface its buffered output.
                let output = child.wait_with_output().await.ok();
                let (stdout, errors) = match output {
                    Some(o) => (
                        String::from_utf8_lossy(&o.stdout).into_owned(),
                        String::from_utf8_lossy(&o.stderr).into_owned(),
                    ),
                    None => (String::new(), String::new()),
                };
                return ValidationReport::failed(
                    Phase::Dev,
                    format!("dev server exited during warm-up with {status}"),
                    stdout,
                    errors,
                );
            }
            Ok(None) => {}
            Err(e) => {
                shutdown_process_group(&mut child, self.settings.grace).await;
                return ValidationReport::failed(
                    Phase::Dev,
                    format!("could not poll dev server: {e}"),
                    String::new(),
                    String::new(),
                );
            }
        }

        // One bounded probe, then teardown regardless of its outcome.
        let health = self.health_check().await;
        shutdown_process_group(&mut child, self.settings.grace).await;

        match health {
            Ok(200) => {
                info!("validation pipeline passed");
                ValidationReport::passed("all phases passed, health check returned 200")
            }
            Ok(status) => ValidationReport::failed(
                Phase::Dev,
                format!("health check returned status {status}"),
                String::new(),
                String::new(),
            ),
            Err(e) => ValidationReport::failed(
                Phase::Dev,
                format!("health check failed: {e}"),
                String::new(),
                String::new(),
            ),
        }
    }

    async fn health_check(&self) -> Result<u16, String> {
        let client = reqwest::Client::builder()
            .timeout(self.settings.health_timeout)
            .build()
            .map_err(|e| e.to_string())?;
        let response = client
            .get(&self.settings.health_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(response.status().as_u16())
    }
}

/// Terminate a child and its process group: SIGTERM, bounded grace wait,
/// then SIGKILL. Runs on every dev-phase exit path.
async fn shutdown_process_group(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            let pgid = Pid::from_raw(pid as i32);
            let _ = killpg(pgid, Signal::SIGTERM);
            if timeout(grace, child.wait()).await.is_err() {
                warn!(pid, "dev server ignored SIGTERM, escalating to SIGKILL");
                let _ = killpg(pgid, Signal::SIGKILL);
                let _ = child.wait().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = grace;
        let _ = child.kill().await;
        let _ = child.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_settings() -> PipelineSettings {
        PipelineSettings {
            install_command: argv(&["true"]),
            build_command: argv(&["true"]),
            dev_command: argv(&["sh", "-c", "sleep 30"]),
            install_timeout: Duration::from_secs(5),
            build_timeout: Duration::from_secs(5),
            warmup: Duration::from_millis(200),
            grace: Duration::from_secs(2),
            // Reserved port, nothing listens here.
            health_url: "http://127.0.0.1:1/health".to_string(),
            health_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn install_failure_short_circuits() {
        let dir = TempDir::new().unwrap();
        let mut settings = fast_settings();
        settings.install_command = argv(&["sh", "-c", "echo out; echo err >&2; exit 1"]);
        settings.build_command = argv(&["sh", "-c", "touch built"]);

        let report = ValidationPipeline::new(dir.path(), settings).run().await;
        assert!(!report.success);
        assert_eq!(report.phase, Some(Phase::Install));
        assert!(report.stdout.contains("out"));
        assert!(report.errors.contains("err"));
        // Build never ran.
        assert!(!dir.path().join("built").exists());
    }

    #[tokio::test]
    async fn step_timeout_is_a_phase_failure() {
        let dir = TempDir::new().unwrap();
        let mut settings = fast_settings();
        settings.install_command = argv(&["sh", "-c", "sleep 10"]);
        settings.install_timeout = Duration::from_millis(200);

        let report = ValidationPipeline::new(dir.path(), settings).run().await;
        assert!(!report.success);
        assert_eq!(report.phase, Some(Phase::Install));
        assert!(report.message.contains("timed out"));
    }

    #[tokio::test]
    async fn dev_server_death_during_warmup_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut settings = fast_settings();
        settings.dev_command = argv(&["sh", "-c", "echo boom >&2; exit 3"]);

        let report = ValidationPipeline::new(dir.path(), settings).run().await;
        assert!(!report.success);
        assert_eq!(report.phase, Some(Phase::Dev));
        assert!(report.message.contains("warm-up"));
        assert!(report.errors.contains("boom"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dev_server_is_dead_after_failed_health_check() {
        let dir = TempDir::new().unwrap();
        let mut settings = fast_settings();
        // The shell records its pid then becomes the long-lived server.
        settings.dev_command = argv(&["sh", "-c", "echo $$ > pid; exec sleep 30"]);

        let report = ValidationPipeline::new(dir.path(), settings).run().await;
        assert!(!report.success);
        assert_eq!(report.phase, Some(Phase::Dev));
        assert!(report.message.contains("health check"));

        let pid: i32 = std::fs::read_to_string(dir.path().join("pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        // The group was torn down; the pid must be gone.
        use nix::sys::signal::kill;
        use nix::unistd::Pid;
        assert!(kill(Pid::from_raw(pid), None).is_err());
    }

    #[tokio::test]
    async fn launch_failure_names_the_phase() {
        let dir = TempDir::new().unwrap();
        let mut settings = fast_settings();
        settings.build_command = argv(&["definitely-not-a-real-binary"]);

        let report = ValidationPipeline::new(dir.path(), settings).run().await;
        assert!(!report.success);
        assert_eq!(report.phase, Some(Phase::Build));
        assert!(report.message.contains("failed to launch"));
    }

    #[test]
    fn report_serializes_with_phase_tag() {
        let report = ValidationReport::failed(
            Phase::Install,
            "npm exited with exit status: 1",
            String::new(),
            "missing dependency".to_string(),
        );
        let v = report.to_value();
        assert_eq!(v["success"], false);
        assert_eq!(v["phase"], "install");
        assert_eq!(v["errors"], "missing dependency");
        // Empty stdout is omitted.
        assert!(v.get("stdout").is_none());
    }
}
