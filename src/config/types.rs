use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Index walk and fan-out configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HarvestConfig {
    /// Site root used to resolve relative listing links
    pub site_url: String,

    /// Search index location; page 1 is `{index_url}/`, page N is `{index_url}/N/`
    pub index_url: String,

    /// First index page to walk (inclusive)
    pub start_page: u32,

    /// Last index page to walk (inclusive)
    pub end_page: u32,

    /// Maximum number of detail pages fetched at once
    pub max_concurrent: u32,

    /// Per-page cap on collected listing URLs (None = natural page size)
    pub max_listings_per_page: Option<usize>,

    /// Pause after each index page that yielded listings (milliseconds)
    pub page_delay_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.biturbo.az".to_string(),
            index_url: "https://www.biturbo.az/az/axtar".to_string(),
            start_page: 1,
            end_page: 50,
            max_concurrent: 10,
            max_listings_per_page: None,
            page_delay_ms: 1000,
        }
    }
}

impl HarvestConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// HTTP fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Total request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Total number of attempts per URL
    pub max_retries: u32,

    /// Backoff unit; the delay after attempt `i` is `base * 2^i` (milliseconds)
    pub backoff_base_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the delimited table written at the end of a run
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "biturbo_listings.csv".to_string(),
        }
    }
}
