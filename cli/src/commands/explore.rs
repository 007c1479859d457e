use anyhow::Result;
use colored::Colorize;
use mimic_core::{ExplorationAgent, ExplorationReport, MimicConfig};
use serde_json::json;
use std::path::Path;
use tracing::info;

pub async fn execute(
    config: &MimicConfig,
    target_url: &str,
    output: Option<&Path>,
) -> Result<()> {
    println!("{}", format!("Exploring API at {}", target_url).cyan().bold());

    let backend = super::backend_from(config)?;
    let agent = ExplorationAgent::new(
        backend,
        target_url,
        &config.provider.model,
        config.provider.max_tokens,
        config.agents.exploration_max_iterations,
    )?;

    let report = agent.explore().await?;
    print_report(&report);

    if let Some(path) = output {
        let payload = json!({
            "success": report.success,
            "iterations": report.iterations,
            "summary": report.summary,
            "observations": report.observations,
        });
        std::fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        info!("Exploration report written to {:?}", path);
        println!("Report written to {}", path.display().to_string().green());
    }

    if !report.success {
        anyhow::bail!("Exploration did not complete within the iteration ceiling");
    }
    Ok(())
}

fn print_report(report: &ExplorationReport) {
    if report.success {
        println!(
            "\n{}",
            format!("Exploration complete in {} iterations.", report.iterations)
                .green()
                .bold()
        );
    } else {
        println!(
            "\n{}",
            format!(
                "Exploration stopped at the iteration ceiling ({} iterations).",
                report.iterations
            )
            .yellow()
            .bold()
        );
    }
    if !report.summary.is_empty() {
        println!("  Summary: {}", report.summary);
    }
    println!("  Observations: {}", report.observations.len());
    for obs in &report.observations {
        println!("    [{}] {}", obs.category.cyan(), obs.observation);
    }
}
