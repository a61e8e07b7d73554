/// URL state definitions for tracking crawl progress
///
/// This module defines the states a URL moves through during a crawl and the
/// transitions between them that the coordinator accepts.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UrlState {
    // ===== Active States =====
    /// URL has never been seen
    #[default]
    Untracked,

    /// URL sits in the frontier queue, waiting to be dispatched
    Queued,

    /// URL has been dispatched and is in flight through fetch and parse
    Processing,

    // ===== Terminal States =====
    /// URL was fetched and parsed; its children are in the result
    Processed,

    /// URL fetch failed
    Error,
}

impl UrlState {
    /// Returns true if this is a terminal state (no further transition occurs)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Error)
    }

    /// Returns true if `self -> next` is one of the four legal transitions
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Untracked, Self::Queued)
                | (Self::Queued, Self::Processing)
                | (Self::Processing, Self::Processed)
                | (Self::Processing, Self::Error)
        )
    }

    /// Returns the lowercase name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untracked => "untracked",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
