use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use etlsmith_cli::plan_file::load_plan;
use etlsmith_cli::{AppConfig, Outcome, Session, SessionOptions};
use etlsmith_core::{Catalog, FlowBuilder};
use etlsmith_nifi::NifiClient;
use etlsmith_planner::LlmPlanner;
use tracing::info;

/// Describe a data pipeline in plain language and build it in Apache NiFi
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Describe the flow once instead of starting an interactive session
    #[arg(short, long)]
    prompt: Option<String>,

    /// Build a saved plan (JSON or YAML) without calling the planner
    #[arg(long, conflicts_with = "prompt")]
    plan_file: Option<PathBuf>,

    /// Build without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Start the flow after a successful build
    #[arg(long)]
    start: bool,
}

fn ensure_built(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Built(result) if !result.success => {
            bail!("Flow build finished with {} error(s)", result.errors.len())
        }
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment variables
    let config = AppConfig::load().context("Failed to load configuration")?;

    etlsmith_monitoring::init_logging(&config.monitoring_config())
        .context("Failed to initialize logging")?;
    info!(nifi_url = %config.nifi_url, model = %config.llm_model, "Starting etlsmith");

    let catalog = Arc::new(Catalog::standard(&config.nifi_bundle_version));
    let client = NifiClient::new(config.nifi_client_config()).context("Failed to create NiFi client")?;
    let builder = FlowBuilder::new(Arc::new(client), catalog.clone());
    let planner = LlmPlanner::new(config.llm_config(), &catalog).context("Failed to create planner")?;

    let options = SessionOptions {
        assume_yes: cli.yes,
        start: cli.start,
    };
    let session = Session::new(Arc::new(planner), builder, options);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    match (cli.plan_file, cli.prompt) {
        (Some(path), _) => {
            let definition = load_plan(&path).context("Failed to load plan file")?;
            let outcome = session.realize(&definition, &mut input, &mut output).await?;
            ensure_built(outcome)?;
        }
        (None, Some(prompt)) => {
            let outcome = session.describe(&prompt, &mut input, &mut output).await?;
            ensure_built(outcome)?;
        }
        (None, None) => {
            session.run_interactive(&mut input, &mut output).await?;
        }
    }

    Ok(())
}
