//! wildbeater - marketplace feedback photo crawler
//!
//! Searches the catalog for a query and downloads every feedback photo of
//! the matching items into a flat output directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wildbeater_core::{
    load_config, load_config_from_env, validate_scrape, Config, MarketplaceClient, PhotoPipeline,
    PipelineError, RunSummary, WbClient,
};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "wildbeater.toml";

/// Conventional exit status for a run interrupted by SIGINT
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "wildbeater")]
#[command(about = "Marketplace feedback photo crawler")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog and download feedback photos
    Parse(ParseArgs),
}

#[derive(Args, Debug, Default)]
struct ParseArgs {
    /// Search query
    #[arg(short, long)]
    query: Option<String>,

    /// Pages to scan
    #[arg(short, long)]
    pages: Option<u32>,

    /// Output directory for images
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Do not skip existing files
    #[arg(long)]
    no_skip_existing: bool,

    /// Maximum in-flight requests per stage
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl ParseArgs {
    /// Apply command-line overrides on top of file and env values.
    fn apply(&self, config: &mut Config) {
        let scrape = &mut config.scrape;
        if let Some(query) = &self.query {
            scrape.query = query.clone();
        }
        if let Some(pages) = self.pages {
            scrape.pages = pages;
        }
        if let Some(out_dir) = &self.out_dir {
            scrape.out_dir = out_dir.clone();
        }
        if let Some(timeout) = self.timeout {
            scrape.timeout_secs = Some(timeout);
        }
        if self.no_skip_existing {
            scrape.skip_existing = false;
        }
        if let Some(concurrency) = self.concurrency {
            scrape.concurrency = concurrency;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<PipelineError>() {
            Some(PipelineError::Cancelled) => {
                warn!("Interrupted");
                ExitCode::from(EXIT_CANCELLED)
            }
            _ => {
                error!("Fatal error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Parse(args) => {
            args.apply(&mut config);
            check_crawl_config(&config)?;
            let summary = crawl(config).await?;
            print_summary(&summary, args.json)?;
        }
    }
    Ok(())
}

/// Validate what a crawl consumes. The `[sort]` section is not checked here.
fn check_crawl_config(config: &Config) -> Result<()> {
    validate_scrape(&config.scrape).context("Configuration validation failed")?;
    if config.scrape.query.trim().is_empty() {
        bail!("a search query is required (--query or scrape.query)");
    }
    Ok(())
}

/// Load the explicit config file, the default one if present, or env and defaults only.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return load_config_from_env().context("Failed to load configuration");
            }
            default
        }
    };

    info!("Loading configuration from {:?}", path);
    load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
}

async fn crawl(config: Config) -> Result<RunSummary> {
    let scrape = config.scrape;
    let client: Arc<dyn MarketplaceClient> = Arc::new(
        WbClient::new(scrape.client_config()).map_err(PipelineError::Session)?,
    );

    let cancel = CancellationToken::new();
    let pipeline = PhotoPipeline::new(client, scrape).with_cancellation(cancel.clone());

    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling run");
            cancel.cancel();
        }
    });

    let result = pipeline.run().await;
    interrupt.abort();
    Ok(result?)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(summary).context("Failed to encode summary")?;
        println!("{}", out);
        return Ok(());
    }

    println!("Query: {}", summary.query);
    println!(
        "Search: {} rows from {} pages, {} items",
        summary.rows_found, summary.pages_requested, summary.unique_items
    );
    println!(
        "Photos: {} scheduled, {} skipped, {} downloaded, {} failed",
        summary.photos_scheduled,
        summary.photos_skipped,
        summary.photos_downloaded,
        summary.photos_failed
    );
    let errors = summary.recoverable_errors();
    if errors > 0 {
        println!("Recoverable errors: {}", errors);
    }
    Ok(())
}
