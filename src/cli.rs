use crate::aggregate::{DEFAULT_PAGE_SIZE, StatsAggregator};
use crate::config::{
    DEFAULT_DB, DEFAULT_HOST, DEFAULT_PORT, ENV_CREDS_FILE, ENV_CREDS_SECTION, ENV_MONGO_DB,
    ENV_MONGO_HOST, ENV_MONGO_PORT, ENV_MONGO_URI, ENV_PAGE_SIZE, RunConfig,
};
use crate::credentials::{Credentials, DEFAULT_CREDS_SECTION};
use crate::logging;
use crate::report::{OutputFormat, render_report};
use crate::store::{MongoStore, WorkspaceStore};
use anyhow::Result;
use clap::{ArgAction, Parser};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Credential file (TOML) holding `user` and `pwd`
    /// (default: ./ws_mongo_creds, then the user config directory)
    #[arg(long, env = ENV_CREDS_FILE)]
    pub creds_file: Option<PathBuf>,

    /// Section of the credential file to read
    #[arg(long, env = ENV_CREDS_SECTION, default_value = DEFAULT_CREDS_SECTION)]
    pub creds_section: String,

    /// MongoDB host
    #[arg(long, env = ENV_MONGO_HOST, default_value = DEFAULT_HOST)]
    pub host: String,

    /// MongoDB port
    #[arg(long, env = ENV_MONGO_PORT, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Workspace database name (also the authentication database)
    #[arg(long = "db", env = ENV_MONGO_DB, default_value = DEFAULT_DB)]
    pub database: String,

    /// Full MongoDB connection string; replaces --host and --port
    #[arg(long, env = ENV_MONGO_URI)]
    pub uri: Option<String>,

    /// Objects fetched per page while scanning
    #[arg(long, env = ENV_PAGE_SIZE, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,

    /// Also list every workspace with its visibility and object count
    #[arg(long)]
    pub workspaces: bool,

    /// More progress output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors on stderr
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = RunConfig::from_cli(&cli)?;
    let credentials = Credentials::load(&config.creds_file, &config.creds_section)?;
    let store = MongoStore::connect(&config.target, &credentials)?;

    let output = build_report(&store, &config)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Scans `store` and renders the report; nothing is returned unless the whole scan succeeds.
pub fn build_report<S: WorkspaceStore + ?Sized>(
    store: &S,
    config: &RunConfig,
) -> crate::error::Result<String> {
    let aggregator = StatsAggregator::new(config.page_size)?;
    let report = aggregator.run(store)?;
    info!(
        objects = report.scanned_objects,
        pages = report.pages,
        types = report.types.iter().count(),
        "scan complete"
    );
    render_report(&report, &config.render)
}
