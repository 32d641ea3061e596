use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub max_concurrent: Option<u32>,
    pub max_listings_per_page: Option<usize>,
    pub csv_path: Option<String>,
}

/// Loads and parses a configuration file from the given path
///
/// Every key has a default, so an empty file yields [`Config::default`].
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use biturbo_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Pages: {}-{}", config.harvest.start_page, config.harvest.end_page);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a harvested table can be traced back to the
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies command-line overrides and re-validates the result
///
/// Giving a start page without an end page harvests that single page. When
/// a page range is given without an explicit output path, the table is named
/// after the range.
pub fn apply_overrides(mut config: Config, overrides: &Overrides) -> Result<Config, ConfigError> {
    if let Some(start) = overrides.start_page {
        let end = overrides.end_page.unwrap_or(start);
        config.harvest.start_page = start;
        config.harvest.end_page = end;

        if overrides.csv_path.is_none() {
            config.output.csv_path = format!("biturbo_pages_{}_to_{}.csv", start, end);
        }
    }

    if let Some(max_concurrent) = overrides.max_concurrent {
        config.harvest.max_concurrent = max_concurrent;
    }

    if let Some(cap) = overrides.max_listings_per_page {
        config.harvest.max_listings_per_page = Some(cap);
    }

    if let Some(path) = &overrides.csv_path {
        config.output.csv_path = path.clone();
    }

    validate(&config)?;
    Ok(config)
}
