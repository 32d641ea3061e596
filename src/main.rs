//! Biturbo Harvester main entry point
//!
//! This is the command-line interface for the listing harvester.

use anyhow::Context;
use biturbo_harvester::config::{apply_overrides, load_config_with_hash, Config, Overrides};
use biturbo_harvester::crawler::Harvester;
use biturbo_harvester::output::{load_statistics, print_statistics, CsvOutput, OutputHandler};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Biturbo Harvester: a polite concurrent listing harvester
///
/// Walks the search index from START_PAGE to END_PAGE, fetches every
/// listing's detail page with bounded concurrency and writes the extracted
/// records as a CSV table.
#[derive(Parser, Debug)]
#[command(name = "biturbo-harvester")]
#[command(version)]
#[command(about = "A polite concurrent listing harvester", long_about = None)]
struct Cli {
    /// First index page to harvest (default 1)
    #[arg(value_name = "START_PAGE")]
    start_page: Option<u32>,

    /// Last index page to harvest, inclusive (defaults to START_PAGE when that is given, else 50)
    #[arg(value_name = "END_PAGE", requires = "start_page")]
    end_page: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of detail pages fetched at once
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Keep at most N listings from each index page
    #[arg(long, value_name = "N")]
    max_per_page: Option<usize>,

    /// Where to write the CSV table
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and index pages without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Print descriptive statistics for an existing CSV table and exit
    #[arg(long, value_name = "TABLE", conflicts_with = "dry_run")]
    stats: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Some(table) = &cli.stats {
        return handle_stats(table);
    }

    let config = load_effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(config)?;
    } else {
        handle_harvest(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("biturbo_harvester=info,warn"),
            1 => EnvFilter::new("biturbo_harvester=debug,info"),
            2 => EnvFilter::new("biturbo_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and layers CLI overrides on top
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let overrides = Overrides {
        start_page: cli.start_page,
        end_page: cli.end_page,
        max_concurrent: cli.concurrency,
        max_listings_per_page: cli.max_per_page,
        csv_path: cli.output.clone(),
    };

    apply_overrides(config, &overrides).context("invalid harvest settings")
}

/// Handles the --stats mode: summarizes an existing table
fn handle_stats(table: &Path) -> anyhow::Result<()> {
    tracing::info!("Loading table from {}", table.display());
    let stats = load_statistics(table)
        .with_context(|| format!("failed to read table {}", table.display()))?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the --dry-run mode: shows what would be harvested
fn handle_dry_run(config: Config) -> anyhow::Result<()> {
    let harvester = Harvester::new(config)?;
    let config = harvester.config();
    let harvest = &config.harvest;
    let fetch = &config.fetch;

    println!("=== Biturbo Harvester Dry Run ===\n");

    println!("Harvest:");
    println!("  Site: {}", harvest.site_url);
    println!("  Index: {}", harvest.index_url);
    println!("  Pages: {} to {}", harvest.start_page, harvest.end_page);
    println!("  Max concurrent fetches: {}", harvest.max_concurrent);
    match harvest.max_listings_per_page {
        Some(cap) => println!("  Max listings per page: {}", cap),
        None => println!("  Max listings per page: no cap"),
    }
    println!("  Page delay: {}ms", harvest.page_delay_ms);

    println!("\nFetch:");
    println!(
        "  Timeout: {}s (connect {}s)",
        fetch.timeout_secs, fetch.connect_timeout_secs
    );
    println!("  Attempts per URL: {}", fetch.max_retries);
    println!("  Backoff base: {}ms", fetch.backoff_base_ms);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    println!(
        "\nIndex pages ({}):",
        harvest.end_page - harvest.start_page + 1
    );
    for page in harvest.start_page..=harvest.end_page {
        println!("  - {}", harvester.paginator().page_url(page));
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    let csv_path = config.output.csv_path.clone();

    tracing::info!(
        "Harvesting pages {} to {} with {} concurrent requests",
        config.harvest.start_page,
        config.harvest.end_page,
        config.harvest.max_concurrent
    );

    let harvester = Harvester::new(config)?;
    let report = match harvester.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    let mut output = CsvOutput::new(&csv_path);
    output
        .write_records(&report.records)
        .with_context(|| format!("failed to write {}", csv_path))?;
    output.flush()?;

    tracing::info!("Harvest completed successfully");
    Ok(())
}
