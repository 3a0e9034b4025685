//! In-memory DOM and the page abstraction the extractor drives.
//!
//! - [`Document`] - Arena element tree with the queries the scanners need
//! - [`Page`] - Scroll, click and wait operations on a live page
//! - [`SnapshotPage`] - A page replayed from a captured [`Snapshot`]

pub mod document;
pub mod page;
pub mod snapshot;

pub use document::{Document, NodeId, Overflow, ScrollLayout, collapse_whitespace};
pub use page::{Page, ScrollTarget, SnapshotPage};
pub use snapshot::{LayoutSpec, LazyBatch, Snapshot, SnapshotNode, Viewport};
