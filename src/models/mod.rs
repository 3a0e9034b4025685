//! Data models for exported conversations.
//!
//! - [`Message`] - One captured turn with its inferred [`Role`]
//! - [`ExtractionResult`] - Ordered messages plus title and export metadata
//! - [`ProgressEvent`] - Transient status updates emitted during extraction
//! - [`Request`] / [`Response`] - The controller/extractor message protocol
//!
//! Field names follow the JSON export format (`exportDate`, `messageCount`).

pub mod message;
pub mod progress;
pub mod protocol;

pub use message::{ExtractionResult, Message, Role};
pub use progress::{NullSink, ProgressEvent, ProgressSink, ProgressStatus};
pub use protocol::{ProgressMessage, Request, Response};
