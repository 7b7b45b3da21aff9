//! Learning Advisor CLI
//!
//! A command-line tool for querying the learning advisor service and
//! inspecting trained model artifacts offline.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, inspect, models, recommend};
use std::path::PathBuf;

/// Learning Advisor CLI
#[derive(Parser)]
#[command(name = "la")]
#[command(author, version, about = "CLI for the Learning Advisor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via LA_API_URL env var or the config file)
    #[arg(long, env = "LA_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the models known to the advisor
    Models,

    /// Get a recommendation for a learner's metrics
    Recommend {
        /// JSON file of learner metrics, or - for stdin
        #[arg(long)]
        features: String,
    },

    /// Derive metrics from a quiz session and get a recommendation
    Analyze {
        /// JSON file with `outcomes` and optional `history`, or - for stdin
        #[arg(long)]
        session: String,
    },

    /// Predict whether a learner will answer the next question correctly
    Performance {
        /// JSON file of learner metrics, or - for stdin
        #[arg(long)]
        features: String,
    },

    /// Show advisor health
    Health,

    /// Inspect a model artifact file without contacting the service
    Inspect {
        /// Path to the artifact
        artifact: PathBuf,

        /// Logical model name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        let unavailable = e
            .downcast_ref::<client::ClientError>()
            .is_some_and(|c| c.status() == 503);
        if unavailable {
            output::print_info("Run `la models` to see which models failed to load");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Inspect { artifact, name } = &cli.command {
        return inspect::inspect(artifact, name.clone(), cli.format);
    }

    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Models => models::list_models(&client, cli.format).await?,
        Commands::Recommend { features } => {
            recommend::recommend(&client, &features, cli.format).await?
        }
        Commands::Analyze { session } => recommend::analyze(&client, &session, cli.format).await?,
        Commands::Performance { features } => {
            recommend::performance(&client, &features, cli.format).await?
        }
        Commands::Health => health::show_health(&client, cli.format).await?,
        Commands::Inspect { .. } => {}
    }

    Ok(())
}
