use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;

use riser_automate::context::{AutomationContext, RunPayload, SpeckleReporter};
use riser_automate::run::automate_function;

#[derive(Parser, Debug)]
#[command(
    name = "riser-automate",
    about = "Draws per-shaft cross-section schematics from MEP sizing data"
)]
struct Cli {
    /// Path to the run-data JSON written by the host for this invocation.
    #[arg(long, env = "AUTOMATE_RUN_DATA")]
    run_data: PathBuf,

    /// Directory rendered images are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let raw = std::fs::read_to_string(&cli.run_data)
        .with_context(|| format!("reading run data {}", cli.run_data.display()))?;
    let payload: RunPayload = serde_json::from_str(&raw).context("parsing run data")?;
    let RunPayload {
        automation_run_data,
        function_inputs,
    } = payload;

    info!(
        project = %automation_run_data.project_id,
        run = %automation_run_data.automation_run_id,
        "starting automation run"
    );

    let reporter = SpeckleReporter::new(&automation_run_data, function_inputs.speckle_token.clone());
    let context = AutomationContext::new(automation_run_data, reporter);
    automate_function(&context, &function_inputs, &cli.out_dir).await
}
