//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `HarvestPhase`: the run's position in its forward-only phase machine
//! - `HarvestRun`: URLs, records and failure counts accumulated by one run
//! - `HarvestReport`: what a finished run hands back to its caller

mod harvest_phase;
mod harvest_run;

// Re-export main types
pub use harvest_phase::HarvestPhase;
pub use harvest_run::{FailureKind, HarvestReport, HarvestRun};
