//! Turning an [`ExtractionResult`](crate::models::ExtractionResult) into a file.
//!
//! - [`format`] - Text, JSON and Markdown encodings
//! - [`filename`] - Sanitized, dated output filenames
//! - [`writer`] - Writing encoded exports to disk

pub mod filename;
pub mod format;
pub mod writer;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use filename::{export_filename, sanitize_title};
pub use format::{format_export, format_json, format_markdown, format_text, parse_json};
pub use writer::{write_export, write_export_to};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
    #[serde(alias = "md")]
    #[value(alias = "md")]
    Markdown,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}
