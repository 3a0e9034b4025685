//! Text extraction and the validity filter applied to every candidate.

use crate::dom::{Document, NodeId};

/// Bare action labels rendered next to each message
const UI_LABELS: &[&str] = &[
    "share",
    "copy",
    "edit",
    "regenerate",
    "like",
    "dislike",
    "more",
    "retry",
    "listen",
    "show drafts",
    "report",
];

/// Placeholders shown while a response is still streaming in
const LOADING_PLACEHOLDERS: &[&str] = &["loading", "loading...", "thinking", "thinking...", "generating..."];

/// Tags of interactive controls, never message bodies
const CONTROL_TAGS: &[&str] = &["button", "a", "input", "select", "textarea", "option"];

pub fn is_control(doc: &Document, id: NodeId) -> bool {
    doc.tag(id).is_some_and(|t| CONTROL_TAGS.contains(&t))
}

/// Whether `text` reads like message content rather than UI chrome
pub fn is_valid_content(text: &str, min_chars: usize) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    if UI_LABELS.contains(&lower.as_str()) || LOADING_PLACEHOLDERS.contains(&lower.as_str()) {
        return false;
    }
    if text.chars().all(|c| c == '.' || c == '…' || c.is_whitespace()) {
        return false;
    }
    text.chars().count() >= min_chars
}

/// Readable text of `id` if it passes the filter
pub fn extract_text(doc: &Document, id: NodeId, min_chars: usize) -> Option<String> {
    if is_control(doc, id) {
        return None;
    }
    let text = doc.detached_text(id);
    is_valid_content(&text, min_chars).then_some(text)
}
