//! Output module for harvested listings
//!
//! This module handles:
//! - Writing the record set as a delimited table
//! - Reading a table back and computing descriptive statistics

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::{write_csv, CsvOutput};
pub use stats::{load_records, load_statistics, print_statistics, ListingStatistics, Summary};
pub use traits::{OutputError, OutputHandler, OutputResult};
