/// In-memory state of a single harvest invocation
///
/// Owned by the coordinator; written only between units of work, never from
/// inside a concurrent task.
use crate::listing::ListingRecord;
use crate::state::HarvestPhase;
use crate::HarvestError;
use chrono::{DateTime, Utc};

/// Why a single listing did not produce a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The detail page could not be fetched after all retries
    Fetch,
    /// The page was fetched but could not be turned into a record
    Parse,
    /// The unit of work itself died (panic or cancellation)
    Task,
}

/// Accumulated state of one run
#[derive(Debug)]
pub struct HarvestRun {
    phase: HarvestPhase,
    urls: Vec<String>,
    records: Vec<ListingRecord>,
    fetch_failures: usize,
    parse_failures: usize,
    task_failures: usize,
    started_at: DateTime<Utc>,
}

impl HarvestRun {
    pub fn new() -> Self {
        Self {
            phase: HarvestPhase::Idle,
            urls: Vec::new(),
            records: Vec::new(),
            fetch_failures: 0,
            parse_failures: 0,
            task_failures: 0,
            started_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> HarvestPhase {
        self.phase
    }

    /// Moves the run to `target`, rejecting anything but the next phase
    pub fn advance(&mut self, target: HarvestPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(target) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        tracing::debug!("Harvest phase {} -> {}", self.phase, target);
        self.phase = target;
        Ok(())
    }

    /// Appends detail URLs discovered on one index page
    pub fn extend_urls(&mut self, urls: impl IntoIterator<Item = String>) {
        self.urls.extend(urls);
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn record_success(&mut self, record: ListingRecord) {
        self.records.push(record);
    }

    pub fn record_failure(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::Fetch => self.fetch_failures += 1,
            FailureKind::Parse => self.parse_failures += 1,
            FailureKind::Task => self.task_failures += 1,
        }
    }

    pub fn failures(&self) -> usize {
        self.fetch_failures + self.parse_failures + self.task_failures
    }

    pub fn successes(&self) -> usize {
        self.records.len()
    }

    /// Consumes the run into its final report
    pub fn into_report(self, peak_in_flight: usize) -> HarvestReport {
        HarvestReport {
            urls_discovered: self.urls.len(),
            failures: self.fetch_failures + self.parse_failures + self.task_failures,
            fetch_failures: self.fetch_failures,
            parse_failures: self.parse_failures,
            task_failures: self.task_failures,
            peak_in_flight,
            started_at: self.started_at,
            finished_at: Utc::now(),
            records: self.records,
        }
    }
}

impl Default for HarvestRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Successfully extracted records, in completion order
    pub records: Vec<ListingRecord>,
    /// Detail URLs collected from the index, duplicates included
    pub urls_discovered: usize,
    /// Total listings that produced no record
    pub failures: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub task_failures: usize,
    /// Highest number of detail fetches observed in flight at once
    pub peak_in_flight: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl HarvestReport {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
