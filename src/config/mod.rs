//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering command-line overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use biturbo_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvester will use {} concurrent fetches", config.harvest.max_concurrent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, HarvestConfig, OutputConfig};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
    Overrides,
};
pub use validation::{validate, MAX_CONCURRENT_LIMIT};
