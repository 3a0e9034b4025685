//! Export encodings for an [`ExtractionResult`].

use chrono::{DateTime, Utc};

use super::ExportFormat;
use crate::error::ExportResult;
use crate::models::{ExtractionResult, Role};

/// Width of the rule separating messages in the text export
pub const RULE_WIDTH: usize = 50;

fn display_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn markdown_label(role: Role) -> &'static str {
    match role {
        Role::User => "👤 You",
        Role::Assistant => "🤖 Gemini",
    }
}

/// Plain text: title, underline, metadata, then ruled message blocks
pub fn format_text(result: &ExtractionResult) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();
    out.push_str(&result.title);
    out.push('\n');
    out.push_str(&"=".repeat(result.title.chars().count()));
    out.push_str("\n\n");
    out.push_str(&format!("Exported: {}\n", display_date(&result.export_date)));
    out.push_str(&format!("Messages: {}\n", result.message_count));

    for message in &result.messages {
        out.push('\n');
        out.push_str(&rule);
        out.push_str("\n\n");
        out.push_str(&format!("[{}]:\n", message.role.display_label()));
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}

pub fn format_json(result: &ExtractionResult) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Inverse of [`format_json`]
pub fn parse_json(json: &str) -> ExportResult<ExtractionResult> {
    Ok(serde_json::from_str(json)?)
}

pub fn format_markdown(result: &ExtractionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", result.title));
    out.push_str(&format!("**Exported:** {}  \n", display_date(&result.export_date)));
    out.push_str(&format!("**Messages:** {}\n", result.message_count));

    for message in &result.messages {
        out.push_str("\n---\n\n");
        out.push_str(&format!("## {}\n\n", markdown_label(message.role)));
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}

pub fn format_export(result: &ExtractionResult, format: ExportFormat) -> ExportResult<String> {
    match format {
        ExportFormat::Text => Ok(format_text(result)),
        ExportFormat::Json => format_json(result),
        ExportFormat::Markdown => Ok(format_markdown(result)),
    }
}
