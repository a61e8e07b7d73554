//! hostcrawl main entry point
//!
//! This is the command-line interface for the hostcrawl single-host crawler.

use anyhow::Context;
use clap::Parser;
use hostcrawl::config::{load_config, parse_duration, Config};
use hostcrawl::output::write_sitemap;
use hostcrawl::{crawl, parse_seed};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// hostcrawl: a single-host web crawler
///
/// Crawls every page reachable from the seed on the seed's host and writes
/// a JSON sitemap mapping each page to the same-host pages it links to.
#[derive(Parser, Debug)]
#[command(name = "hostcrawl")]
#[command(version)]
#[command(about = "A single-host web crawler", long_about = None)]
struct Cli {
    /// Seed URL; https is assumed when no scheme is given
    #[arg(value_name = "SEED")]
    seed: String,

    /// Per-request timeout (e.g. 500ms, 10s, 1m30s)
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Rate limit in requests per minute (0 = unlimited)
    #[arg(long, value_name = "N")]
    rate: Option<u32>,

    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the sitemap is written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Enable debug logs
    #[arg(long)]
    debug: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    quiet: bool,
}

fn parse_timeout(input: &str) -> Result<Duration, String> {
    parse_duration(input).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let verbosity = if cli.debug { cli.verbose.max(1) } else { cli.verbose };
    setup_logging(verbosity, cli.quiet);

    let config = build_config(&cli)?;
    let seed = parse_seed(&cli.seed).with_context(|| format!("invalid seed '{}'", cli.seed))?;

    let result = crawl(seed.clone(), &config).await.context("crawl failed")?;

    tracing::info!(
        pages = result.links.len(),
        errors = result.error_count,
        "done"
    );

    if result.is_empty() {
        tracing::warn!("no URLs processed");
        return Ok(ExitCode::FAILURE);
    }

    let path = write_sitemap(&result, &config.output.directory, &seed)
        .context("failed to write sitemap")?;
    tracing::info!(file = %path.display(), "result written");

    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hostcrawl=info,warn"),
            1 => EnvFilter::new("hostcrawl=debug,info"),
            _ => EnvFilter::new("hostcrawl=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Layers command-line values over the configuration file over defaults
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(timeout) = cli.timeout {
        config.crawler.timeout = timeout;
    }
    if let Some(rate) = cli.rate {
        config.crawler.rate_limit = rate;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }

    Ok(config)
}
