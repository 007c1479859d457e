use anyhow::{Context, Result};
use colored::Colorize;
use mimic_core::{GenerationAgent, GenerationReport, MimicConfig};
use serde_json::Value;
use std::path::Path;

pub async fn execute(config: &MimicConfig, spec_path: &Path, output_dir: &Path) -> Result<()> {
    let spec_text = std::fs::read_to_string(spec_path)
        .with_context(|| format!("failed to read specification {:?}", spec_path))?;
    let specification: Value = serde_json::from_str(&spec_text)
        .with_context(|| format!("specification {:?} is not valid JSON", spec_path))?;

    println!(
        "{}",
        format!("Generating project in {}", output_dir.display())
            .cyan()
            .bold()
    );

    let backend = super::backend_from(config)?;
    let agent = GenerationAgent::new(
        backend,
        output_dir,
        config.validation.to_settings(),
        &config.provider.model,
        config.provider.max_tokens,
        config.agents.generation_max_iterations,
    );

    let report = agent.generate(&specification).await?;
    print_report(&report);

    if !report.success {
        anyhow::bail!("Generation did not complete within the iteration ceiling");
    }
    Ok(())
}

pub(crate) fn print_report(report: &GenerationReport) {
    if report.success {
        println!(
            "\n{}",
            format!("Generation complete in {} iterations.", report.iterations)
                .green()
                .bold()
        );
    } else {
        println!(
            "\n{}",
            format!(
                "Generation stopped at the iteration ceiling ({} iterations).",
                report.iterations
            )
            .yellow()
            .bold()
        );
    }
    if !report.summary.is_empty() {
        println!("  Summary: {}", report.summary);
    }
    println!("  Generated files ({}):", report.generated_files.len());
    for file in &report.generated_files {
        println!("    {}", file);
    }
    println!("  Output directory: {}", report.output_dir.display());
}
