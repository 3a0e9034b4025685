//! Gemini Chat Exporter - Capture a Gemini conversation page as a portable export
//!
//! This library drives a conversation page to completeness and turns it into an
//! ordered list of messages. It supports:
//!
//! - Loading lazily-materialized history by scrolling the conversation container
//! - Expanding truncated ("show more") messages
//! - Identifying messages and their author role with a cascade of scan strategies
//! - Encoding the result as plain text, JSON or Markdown
//!
//! Pages are reached through the [`dom::Page`] trait; [`SnapshotPage`] replays a
//! captured page from a JSON snapshot.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use gemini_chat_exporter::{ExportFormat, ExporterConfig, NullSink, SnapshotPage};
//! use gemini_chat_exporter::{extract_chat, format_export};
//!
//! let mut page = SnapshotPage::load(Path::new("conversation.json"))?;
//! let result = extract_chat(&mut page, &ExporterConfig::default(), &mut NullSink)?;
//! println!("{}", format_export(&result, ExportFormat::Markdown)?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod extractor;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigLoader, ExporterConfig};
pub use dom::{Page, SnapshotPage};
pub use error::{ExportError, ExportResult};
pub use export::{ExportFormat, format_export, write_export};
pub use extractor::{ExtractionSession, extract_chat, handle_request};
pub use models::{ExtractionResult, Message, NullSink, ProgressEvent, Request, Response, Role};
