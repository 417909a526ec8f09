//! `ghost-export`: exports a Ghost site's pages and posts as static files.
mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use ghost_export_engine::{run_export, GhostContentClient, ReqwestDownloader, RunSummary};

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_level(), cli.log_destination());

    match run(cli) {
        Ok(summary) => {
            engine_info!(
                "{} items exported, {} skipped, {} failed",
                summary.exported,
                summary.skipped,
                summary.failed
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            engine_error!("export failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    let config = cli.into_config();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    runtime.block_on(async move {
        let source = GhostContentClient::new(
            config.base_url(),
            config.backend_api_key.clone(),
            &config.download,
        )?;
        let downloader =
            Arc::new(ReqwestDownloader::new(&config.download).context("building http client")?);
        let summary = run_export(config, &source, downloader).await?;
        Ok::<_, anyhow::Error>(summary)
    })
}
