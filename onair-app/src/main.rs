use anyhow::Result;
use clap::Parser;
use onair_common::observability::init_logging;
use onair_config::{OnairConfig, OnairConfigLoader};
use onair_sync::RunOutcome;
use std::path::PathBuf;
use wiring::{build_pipeline, log_config};
mod wiring;

const DEFAULT_CONFIG_FILE: &str = "onair.yaml";

/// Create Todoist reminders for today's watchable Tigers broadcasts.
#[derive(Debug, Parser)]
#[command(name = "onair", version)]
struct Cli {
    /// YAML config file; `onair.yaml` in the working directory is used when present.
    #[arg(long, env = "ONAIR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1) .env feeds the plain variables the default config expands
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // 2) Load config (env wins over file, file over defaults)
    let loader = match cli.config {
        Some(path) => OnairConfigLoader::new().with_file(path),
        None => OnairConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: OnairConfig = loader.load()?;

    // 3) Logging from the loaded settings
    let log_path = init_logging(log_config(&cfg.log))?;
    tracing::info!(log_file = %log_path.display(), "onair.start");

    let pipeline = build_pipeline(&cfg)?;
    match pipeline.run_once().await {
        Ok(report) => {
            if report.outcome == RunOutcome::Disabled {
                tracing::info!("run.enabled is off; nothing to do");
            }
            if report.auth_failures > 0 {
                tracing::error!(
                    auth_failures = report.auth_failures,
                    "task service rejected the API token; rotate TODOIST_API_TOKEN"
                );
            }
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "onair.run.failed");
            Err(err.into())
        }
    }
}
