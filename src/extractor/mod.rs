//! The page-side extraction pipeline.
//!
//! # Stages
//!
//! - **Loading** ([`loader`]): scroll the conversation container to the top until
//!   the page stops materializing older turns, bounded by a stuck streak and a
//!   hard iteration ceiling.
//! - **Expanding** ([`expander`]): click "show more" style controls until a pass
//!   finds nothing new.
//! - **Extracting** ([`scanner`]): run the strategy cascade, classify roles
//!   ([`classifier`]), filter noise ([`text`]) and drop duplicates ([`dedup`]).
//!
//! # Error Handling Strategy
//!
//! Loading never fails: it is best effort and proceeds with whatever content
//! is present. Expansion fails only if the page rejects a click. Scanning
//! cannot fail; an empty result is a valid result. The [`coordinator`] turns
//! the first error into a failed response and skips the remaining stages.

pub mod classifier;
pub mod coordinator;
pub mod dedup;
pub mod expander;
pub mod loader;
pub mod scanner;
pub mod text;

pub use coordinator::{
    ExtractionSession, ExtractionState, check_page, extract_chat, handle_request,
};
pub use dedup::{DedupMode, Deduplicator};
pub use expander::{ExpandReport, TruncationExpander};
pub use loader::{HistoryLoader, LoadReport, find_scroll_container};
pub use scanner::{
    ContentRegionStrategy, FullTextStrategy, MessageScanner, RoleMarkedStrategy, ScanContext,
    ScanOutcome, ScanStrategy,
};
