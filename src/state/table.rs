//! Per-URL state table and progress counters
//!
//! The table is keyed by [`state_key`], so `http://host/a` and
//! `https://host/a` share one entry.

use crate::state::UrlState;
use crate::url::state_key;
use crate::CrawlError;
use std::collections::HashMap;
use url::Url;

/// Progress counters, updated only as a side effect of state transitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// URLs currently in flight through fetch and parse
    pub processing: usize,

    /// URLs that ended in the error state
    pub errors: usize,
}

/// Tracks the state of every URL seen during a crawl
#[derive(Debug, Default)]
pub struct StateTable {
    states: HashMap<String, UrlState>,
    counters: Counters,
}

impl StateTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state of `url`, `Untracked` if it was never recorded
    pub fn get(&self, url: &Url) -> UrlState {
        self.states
            .get(&state_key(url))
            .copied()
            .unwrap_or_default()
    }

    /// Moves `url` to `next`, applying the transition's counter side effect
    ///
    /// # Transitions
    ///
    /// | From | To | Side effect |
    /// |------|----|-------------|
    /// | untracked | queued | none |
    /// | queued | processing | processing += 1 |
    /// | processing | processed | processing -= 1 |
    /// | processing | error | processing -= 1, errors += 1 |
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The transition was applied
    /// * `Err(CrawlError::InvalidTransition)` - Any other pair; the table is
    ///   left untouched
    pub fn set(&mut self, url: &Url, next: UrlState) -> Result<(), CrawlError> {
        let key = state_key(url);
        let prev = self.states.get(&key).copied().unwrap_or_default();

        if !prev.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                url: url.to_string(),
                from: prev,
                to: next,
            });
        }

        if next == UrlState::Processing {
            self.counters.processing += 1;
        }
        if next.is_terminal() {
            self.counters.processing -= 1;
        }
        if next == UrlState::Error {
            self.counters.errors += 1;
        }

        self.states.insert(key, next);
        Ok(())
    }

    /// Returns the current counters
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Number of URLs ever tracked
    pub fn tracked(&self) -> usize {
        self.states.len()
    }
}
