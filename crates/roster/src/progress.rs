//! Progress reporting for the network-bound stages.

use std::fmt;

/// A stage of a run that makes one external call per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Company name to ticker lookups.
    Resolve,
    /// Per-symbol history downloads.
    Fetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve => write!(f, "Resolving symbols"),
            Self::Fetch => write!(f, "Fetching returns"),
        }
    }
}

/// Receives progress notifications. All methods default to doing nothing.
pub trait Progress {
    /// A stage is starting with `total` items.
    fn begin(&self, _stage: Stage, _total: usize) {}

    /// One item of the current stage has completed.
    fn advance(&self, _item: &str) {}

    /// The current stage is done.
    fn finish(&self, _stage: Stage) {}
}

/// Discards all progress notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
