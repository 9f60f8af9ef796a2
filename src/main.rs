//! CLI entry point for the PDF harvester.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::{DropboxClient, HarvestResult, Harvester, StorageClient};
use tracing::{debug, info};

mod app_config;
mod cli;
mod exit_handler;

use app_config::{LoadedConfig, RuntimeSettings};
use cli::Args;
use exit_handler::ProcessExit;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    match run(&args).await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            exit_handler::determine_exit_outcome(&error).into()
        }
    }
}

async fn run(args: &Args) -> Result<ProcessExit> {
    let loaded = match args.config.as_deref() {
        Some(path) => app_config::load_explicit_file_config(path)?,
        None => app_config::load_default_file_config()?,
    };
    let settings = RuntimeSettings::resolve(args, loaded.config.as_ref());

    init_tracing(settings.log_level);
    log_config_source(&loaded);
    debug!(
        path = %args.path,
        staging_parent = %settings.staging_parent.display(),
        api_base_url = %settings.dropbox.api_base_url,
        "CLI arguments resolved"
    );
    info!("Harvester starting");

    let client = DropboxClient::from_settings(&settings.dropbox)
        .context("Failed to build storage client")?;
    let harvester = Harvester::new(settings.staging_parent);

    let result = harvester
        .harvest(client.as_ref().map(|c| c as &dyn StorageClient), &args.path)
        .await?;

    print_result(&result, args)?;
    Ok(ProcessExit::Success)
}

/// Priority: `RUST_LOG` env var > CLI/config level.
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn log_config_source(loaded: &LoadedConfig) {
    match (&loaded.path, loaded.config.is_some()) {
        (Some(path), true) => debug!(path = %path.display(), "Loaded config file"),
        (Some(path), false) => debug!(path = %path.display(), "No config file, using defaults"),
        (None, _) => debug!("No config location resolved, using defaults"),
    }
}

fn print_result(result: &HarvestResult, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for name in result.retrieved_filenames() {
        println!("{name}");
    }
    if !args.quiet {
        eprintln!(
            "Retrieved {} PDF file(s) into {}",
            result.count(),
            result.staging_dir().display()
        );
    }
    Ok(())
}
