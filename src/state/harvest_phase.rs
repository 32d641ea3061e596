/// Harvest phase definitions for tracking run progress
///
/// A run moves strictly forward through
/// `Idle → PaginatingIndex → FanningOutDetails → Aggregating → Done`.
use std::fmt;

/// Represents the current phase of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarvestPhase {
    /// Run constructed, nothing fetched yet
    Idle,

    /// Walking index pages sequentially and collecting detail URLs
    PaginatingIndex,

    /// Detail fetches issued concurrently under the gate
    FanningOutDetails,

    /// Collecting per-URL outcomes in completion order
    Aggregating,

    /// Results handed back to the caller
    Done,
}

impl HarvestPhase {
    /// Returns true once the run has produced its result
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the phase that follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::PaginatingIndex),
            Self::PaginatingIndex => Some(Self::FanningOutDetails),
            Self::FanningOutDetails => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Checks if a transition from this phase to another is valid
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Short lowercase label used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PaginatingIndex => "paginating_index",
            Self::FanningOutDetails => "fanning_out_details",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
        }
    }
}

impl Default for HarvestPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for HarvestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
