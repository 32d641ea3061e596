//! Listing schema
//!
//! - `ListingRecord`: one harvested detail page, one string per column
//! - `ListingField`: names a column; drives label dispatch and table headers
//! - `labels`: label-to-field lookup tables and value reduction rules

pub mod labels;
mod record;

pub use record::{ListingField, ListingRecord, DEFAULT_CURRENCY, EXTRAS_SEPARATOR};
