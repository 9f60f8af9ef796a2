//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Harvest every PDF under a cloud-storage folder into a local staging directory.
///
/// The remote directory layout is mirrored under a freshly created
/// `pdf-harvest-*` directory, which is left in place for the caller.
#[derive(Parser)]
#[command(name = "pdf-harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Remote folder to harvest (empty or "/" for the account root)
    #[arg(default_value = "")]
    pub path: String,

    /// Access token for the storage account (default: $DROPBOX_ACCESS_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Parent directory for the staging directory (default: system temp dir)
    #[arg(short = 's', long)]
    pub staging_dir: Option<PathBuf>,

    /// Config file to load instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL for listing endpoints
    #[arg(long)]
    pub api_url: Option<String>,

    /// Base URL for download endpoints
    #[arg(long)]
    pub content_url: Option<String>,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// HTTP request timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
