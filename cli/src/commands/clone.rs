use anyhow::Result;
use colored::Colorize;
use mimic_core::{ExplorationAgent, GenerationAgent, MimicConfig, SpecificationAgent};
use std::path::Path;
use tracing::info;

/// Full pipeline: explore the target, synthesize a specification, then
/// generate and validate a clone.
pub async fn execute(config: &MimicConfig, target_url: &str, output_dir: &Path) -> Result<()> {
    let backend = super::backend_from(config)?;

    // Phase 1: exploration
    println!("{}", format!("[1/3] Exploring {}", target_url).cyan().bold());
    let explorer = ExplorationAgent::new(
        backend.clone(),
        target_url,
        &config.provider.model,
        config.provider.max_tokens,
        config.agents.exploration_max_iterations,
    )?;
    let exploration = explorer.explore().await?;
    if !exploration.success {
        anyhow::bail!("Exploration did not complete within the iteration ceiling");
    }
    println!(
        "  {} observations in {} iterations",
        exploration.observations.len(),
        exploration.iterations
    );

    // Phase 2: specification synthesis
    println!("{}", "[2/3] Synthesizing specification".cyan().bold());
    let specifier = SpecificationAgent::new(
        backend.clone(),
        &config.provider.model,
        config.provider.max_tokens,
        config.agents.specification_max_iterations,
    );
    let spec_result = specifier
        .generate(target_url, &exploration.observations)
        .await?;
    let specification = match spec_result.specification {
        Some(spec) if spec_result.success => spec,
        _ => anyhow::bail!("Specification synthesis failed"),
    };

    std::fs::create_dir_all(output_dir)?;
    let spec_path = output_dir.join("specification.json");
    std::fs::write(&spec_path, serde_json::to_string_pretty(&specification)?)?;
    info!("Specification written to {:?}", spec_path);

    // Phase 3: code generation with validation
    println!("{}", "[3/3] Generating clone".cyan().bold());
    let generator = GenerationAgent::new(
        backend,
        output_dir,
        config.validation.to_settings(),
        &config.provider.model,
        config.provider.max_tokens,
        config.agents.generation_max_iterations,
    );
    let report = generator.generate(&specification).await?;
    super::generate::print_report(&report);

    if !report.success {
        anyhow::bail!("Generation did not complete within the iteration ceiling");
    }
    println!("\n{}", "Clone ready.".green().bold());
    Ok(())
}
