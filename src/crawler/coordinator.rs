//! Harvest coordinator - main run orchestration logic
//!
//! This module drives a complete run:
//! - Walking the search index sequentially to collect detail URLs
//! - Fanning every URL out as an independent task behind the concurrency gate
//! - Aggregating outcomes in completion order with per-listing isolation
//! - Handing the successful records back to the caller

use crate::config::Config;
use crate::crawler::extractor::{DetailExtractor, ExtractError};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::gate::ConcurrencyGate;
use crate::crawler::paginator::IndexPaginator;
use crate::listing::ListingRecord;
use crate::state::{FailureKind, HarvestPhase, HarvestReport, HarvestRun};
use crate::HarvestError;
use std::sync::Arc;
use tokio::task::JoinSet;

/// What became of one detail URL
#[derive(Debug)]
enum DetailOutcome {
    Extracted(ListingRecord),
    Unfetched(FetchError),
    Unparsed(ExtractError),
}

/// Main harvest coordinator structure
///
/// Owns the HTTP client, both gates and the extractor for the lifetime of a
/// run; dropping the harvester tears the client down.
pub struct Harvester {
    config: Arc<Config>,
    fetcher: Fetcher,
    paginator: IndexPaginator,
    extractor: Arc<DetailExtractor>,
    gate: ConcurrencyGate,
}

impl Harvester {
    /// Creates a new harvester from a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Successfully created harvester
    /// * `Err(HarvestError)` - Failed to build the client, parse a configured URL or compile selectors
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(&config.fetch)?;
        let paginator = IndexPaginator::new(fetcher.clone(), &config.harvest)?;
        let extractor = DetailExtractor::new()?;
        let gate = ConcurrencyGate::new(config.harvest.max_concurrent as usize);

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            paginator,
            extractor: Arc::new(extractor),
            gate,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The gate bounding detail-page fetches
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn paginator(&self) -> &IndexPaginator {
        &self.paginator
    }

    /// Runs the harvest to completion
    ///
    /// Per-listing failures are counted and logged, never returned. The only
    /// errors are internal phase-machine violations.
    pub async fn run(&self) -> Result<HarvestReport, HarvestError> {
        let harvest = &self.config.harvest;
        let mut run = HarvestRun::new();

        run.advance(HarvestPhase::PaginatingIndex)?;
        tracing::info!(
            "Walking index pages {} to {}",
            harvest.start_page,
            harvest.end_page
        );
        let urls = self
            .paginator
            .collect_urls(
                harvest.start_page,
                harvest.end_page,
                harvest.max_listings_per_page,
            )
            .await;
        run.extend_urls(urls);

        run.advance(HarvestPhase::FanningOutDetails)?;
        tracing::info!(
            "Starting to scrape {} listings with up to {} concurrent requests",
            run.urls().len(),
            self.gate.capacity()
        );
        let mut tasks = self.fan_out(run.urls());

        run.advance(HarvestPhase::Aggregating)?;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, DetailOutcome::Extracted(record))) => {
                    tracing::info!("Extracted listing {} from {}", record.listing_id, record.url);
                    run.record_success(record);
                }
                Ok((url, DetailOutcome::Unfetched(e))) => {
                    tracing::warn!("Skipping {}: {}", url, e);
                    run.record_failure(FailureKind::Fetch);
                }
                Ok((url, DetailOutcome::Unparsed(e))) => {
                    tracing::error!("Error extracting data from {}: {}", url, e);
                    run.record_failure(FailureKind::Parse);
                }
                Err(e) => {
                    tracing::error!("Task failed with exception: {}", e);
                    run.record_failure(FailureKind::Task);
                }
            }
        }

        run.advance(HarvestPhase::Done)?;
        let report = run.into_report(self.gate.peak_in_flight());

        tracing::info!(
            "Scraping completed in {:.2} seconds",
            report.duration_seconds()
        );
        tracing::info!(
            "Successfully scraped {} out of {} listings ({} failed, peak {} in flight)",
            report.records.len(),
            report.urls_discovered,
            report.failures,
            report.peak_in_flight
        );

        Ok(report)
    }

    /// Spawns one task per URL; each waits on the gate independently
    fn fan_out(&self, urls: &[String]) -> JoinSet<(String, DetailOutcome)> {
        let mut tasks = JoinSet::new();

        for url in urls {
            let url = url.clone();
            let fetcher = self.fetcher.clone();
            let gate = self.gate.clone();
            let extractor = Arc::clone(&self.extractor);

            tasks.spawn(async move {
                let outcome = process_listing(&fetcher, &gate, &extractor, &url).await;
                (url, outcome)
            });
        }

        tasks
    }
}

/// Fetches and extracts one listing
///
/// The gate permit covers only the network fetch and is released on every
/// exit path before parsing starts.
async fn process_listing(
    fetcher: &Fetcher,
    gate: &ConcurrencyGate,
    extractor: &DetailExtractor,
    url: &str,
) -> DetailOutcome {
    tracing::debug!("Extracting details from: {}", url);

    let fetched = {
        let _permit = gate.acquire().await;
        fetcher.fetch(url).await
    };

    match fetched {
        Ok(page) => match extractor.extract(&page.body, url) {
            Ok(record) => DetailOutcome::Extracted(record),
            Err(e) => DetailOutcome::Unparsed(e),
        },
        Err(e) => DetailOutcome::Unfetched(e),
    }
}

/// Runs a complete harvest and returns the extracted records
///
/// # Example
///
/// ```no_run
/// use biturbo_harvester::config::Config;
/// use biturbo_harvester::crawler::harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.harvest.end_page = 2;
/// let records = harvest(config).await?;
/// println!("{} listings", records.len());
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: Config) -> Result<Vec<ListingRecord>, HarvestError> {
    let harvester = Harvester::new(config)?;
    let report = harvester.run().await?;
    Ok(report.records)
}
