//! Shared per-resource loading state
//!
//! Used by both the native client and web front-ends.

use std::fmt;

/// API documents the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Master,
    FeesLinechart,
    FeesTable,
    DaOverview,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Master,
        Resource::FeesLinechart,
        Resource::FeesTable,
        Resource::DaOverview,
    ];

    /// Path relative to the API base URL or data directory.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Master => "master.json",
            Resource::FeesLinechart => "fees/linechart.json",
            Resource::FeesTable => "fees/table.json",
            Resource::DaOverview => "da_overview.json",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Loading state of one resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchState {
    Loading,
    Ready,
    /// Revalidation failed, an older copy is being served
    Stale(String),
    Failed(String),
}

impl FetchState {
    /// Data is available for rendering (fresh or stale).
    pub fn has_data(&self) -> bool {
        matches!(self, FetchState::Ready | FetchState::Stale(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Stale(e) | FetchState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Loading => f.write_str("loading"),
            FetchState::Ready => f.write_str("ready"),
            FetchState::Stale(e) => write!(f, "stale ({})", e),
            FetchState::Failed(e) => write!(f, "failed ({})", e),
        }
    }
}
