//! Crawler module for listing harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry and backoff
//! - A concurrency gate bounding in-flight requests
//! - Index page walking and link extraction
//! - Detail page field extraction
//! - Overall run coordination

mod coordinator;
mod extractor;
mod fetcher;
mod gate;
mod paginator;
mod parser;

pub use coordinator::{harvest, Harvester};
pub use extractor::{DetailExtractor, ExtractError};
pub use fetcher::{
    browser_headers, build_http_client, FetchError, FetchedPage, Fetcher, RetryPolicy,
    BROWSER_USER_AGENT,
};
pub use gate::{ConcurrencyGate, GatePermit, DEFAULT_MAX_CONCURRENT};
pub use paginator::IndexPaginator;
pub use parser::{extract_listing_links, resolve_link};

pub use crate::state::HarvestReport;
