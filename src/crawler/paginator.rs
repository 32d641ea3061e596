//! Index paginator
//!
//! Walks search index pages strictly in ascending order through a
//! single-slot gate, collecting detail-page URLs from each.

use crate::config::HarvestConfig;
use crate::crawler::gate::ConcurrencyGate;
use crate::crawler::parser::extract_listing_links;
use crate::crawler::Fetcher;
use std::time::Duration;
use url::Url;

/// Sequential walker over the paginated search index
#[derive(Debug, Clone)]
pub struct IndexPaginator {
    fetcher: Fetcher,
    gate: ConcurrencyGate,
    site_url: Url,
    index_url: String,
    page_delay: Duration,
}

impl IndexPaginator {
    pub fn new(fetcher: Fetcher, config: &HarvestConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            fetcher,
            gate: ConcurrencyGate::single(),
            site_url: Url::parse(&config.site_url)?,
            index_url: config.index_url.trim_end_matches('/').to_string(),
            page_delay: config.page_delay(),
        })
    }

    /// Builds the URL of an index page
    ///
    /// Page 1 has no page-number suffix; later pages do.
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/", self.index_url)
        } else {
            format!("{}/{}/", self.index_url, page)
        }
    }

    /// Fetches one index page and returns its detail URLs in document order
    ///
    /// A page that cannot be fetched yields an empty list, the same as a page
    /// that has no listings.
    pub async fn list_detail_urls(&self, page_url: &str) -> Vec<String> {
        tracing::info!("Extracting listing URLs from: {}", page_url);

        let fetched = {
            let _permit = self.gate.acquire().await;
            self.fetcher.fetch(page_url).await
        };

        match fetched {
            Ok(page) => {
                let urls = extract_listing_links(&page.body, &self.site_url);
                tracing::info!("Found {} listing URLs", urls.len());
                urls
            }
            Err(e) => {
                tracing::error!("Index page {} unavailable: {}", page_url, e);
                Vec::new()
            }
        }
    }

    /// Walks pages `start..=end` and returns all collected detail URLs
    ///
    /// Empty pages are logged and skipped. Each page's result is truncated to
    /// `cap` when given. The walk pauses after every page that had listings.
    pub async fn collect_urls(&self, start: u32, end: u32, cap: Option<usize>) -> Vec<String> {
        let mut all_urls = Vec::new();

        for page in start..=end {
            let page_url = self.page_url(page);
            tracing::info!("Extracting listings from page {}: {}", page, page_url);

            let mut page_urls = self.list_detail_urls(&page_url).await;
            if page_urls.is_empty() {
                tracing::warn!("No listings found on page {}", page);
                continue;
            }

            if let Some(cap) = cap {
                page_urls.truncate(cap);
            }
            all_urls.extend(page_urls);

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        tracing::info!(
            "Found total of {} listings across {} pages",
            all_urls.len(),
            end.saturating_sub(start) + 1
        );

        all_urls
    }
}
