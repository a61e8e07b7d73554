//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: The lifecycle of a single URL (untracked, queued, processing, processed, error)
//! - `StateTable`: The coordinator-owned map from URL to state, with progress counters

mod table;
mod url_state;

// Re-export main types
pub use table::{Counters, StateTable};
pub use url_state::UrlState;
