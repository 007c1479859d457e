/// Mimic CLI - explore an API, specify it, and generate a working clone
use clap::{Parser, Subcommand};
use mimic_core::MimicConfig;
use std::path::{Path, PathBuf};

mod commands;

use commands::{clone, explore, generate};

/// Load configuration from the given path or default location
fn load_config(config_path: Option<&Path>) -> anyhow::Result<MimicConfig> {
    let config = MimicConfig::load(config_path)?;
    config.validate()?;
    Ok(config)
}

#[derive(Parser)]
#[command(name = "mimic")]
#[command(about = "Agent-driven API exploration and cloning", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to ~/.mimic/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override log level
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore a target API and report what was discovered
    Explore {
        /// Base URL of the API to explore
        target_url: String,

        /// Write the exploration report (summary + observations) as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a server environment from an existing specification file
    Generate {
        /// Path to a specification JSON file
        spec: PathBuf,

        /// Output directory for the generated project
        #[arg(short, long, default_value = "cloned-env")]
        output_dir: PathBuf,
    },

    /// Full pipeline: explore, specify, then generate a clone
    Clone {
        /// Base URL of the API to clone
        target_url: String,

        /// Output directory for the generated project
        #[arg(short, long, default_value = "cloned-env")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing with custom level if provided
    let log_level = args.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match args.command {
        Commands::Explore { target_url, output } => {
            let config = load_config(args.config.as_deref())?;
            explore::execute(&config, &target_url, output.as_deref()).await?;
        }

        Commands::Generate { spec, output_dir } => {
            let config = load_config(args.config.as_deref())?;
            generate::execute(&config, &spec, &output_dir).await?;
        }

        Commands::Clone {
            target_url,
            output_dir,
        } => {
            let config = load_config(args.config.as_deref())?;
            clone::execute(&config, &target_url, &output_dir).await?;
        }
    }

    Ok(())
}
