//! Captured page snapshots.
//!
//! A snapshot is a JSON description of a chat page: its element tree, the
//! scroll geometry of scrollable elements, and the batches of older turns
//! the live page would only render after being scrolled to the top.
//!
//! ```json
//! {
//!   "url": "https://gemini.google.com/app/4f2a",
//!   "title": "Trip planning",
//!   "viewport": { "width": 1280, "height": 800 },
//!   "root": { "tag": "body", "children": [ { "text": "..." } ] },
//!   "lazyBatches": [ { "parent": "history", "height": 600, "nodes": [] } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::document::{Document, NodeId, Overflow, ScrollLayout};
use crate::error::{ExportError, ExportResult};
use crate::utils::safe_open_file;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280.0, height: 800.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    #[serde(default)]
    pub overflow_y: Overflow,
    #[serde(default)]
    pub scroll_height: f64,
    #[serde(default)]
    pub client_height: f64,
}

/// One node of a snapshot: an element when `tag` is set, otherwise a text node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSpec>,
}

/// Older content the page renders once scrolled to the top
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LazyBatch {
    /// `id` attribute of the element the nodes are prepended to
    pub parent: String,
    /// Pixels the scroll container grows by when the batch loads
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewport: Viewport,
    pub root: SnapshotNode,
    #[serde(default)]
    pub lazy_batches: Vec<LazyBatch>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> ExportResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.root.tag.is_none() {
            return Err(ExportError::Snapshot("root node must be an element".to_string()));
        }
        Ok(snapshot)
    }

    /// Read and parse a snapshot file, rejecting oversized files up front
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = safe_open_file(path)?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }

    /// Materialize the element tree
    pub fn build_document(&self) -> ExportResult<Document> {
        let root_tag = self
            .root
            .tag
            .as_deref()
            .ok_or_else(|| ExportError::Snapshot("root node must be an element".to_string()))?;
        let mut doc = Document::new(root_tag);
        let root = doc.root();
        apply_element_fields(&mut doc, root, &self.root);
        for child in &self.root.children {
            let id = build_node(&mut doc, child);
            doc.append_child(root, id);
        }
        Ok(doc)
    }
}

/// Add `node` and its subtree to `doc` as a detached node
pub fn build_node(doc: &mut Document, node: &SnapshotNode) -> NodeId {
    match &node.tag {
        None => doc.create_text(node.text.as_deref().unwrap_or_default()),
        Some(tag) => {
            let id = doc.create_element(tag, node.attrs.clone());
            apply_element_fields(doc, id, node);
            if let Some(text) = &node.text {
                let text_id = doc.create_text(text);
                doc.append_child(id, text_id);
            }
            for child in &node.children {
                let child_id = build_node(doc, child);
                doc.append_child(id, child_id);
            }
            id
        }
    }
}

fn apply_element_fields(doc: &mut Document, id: NodeId, node: &SnapshotNode) {
    if let Some(el) = doc.element_mut(id) {
        el.attrs = node.attrs.clone();
    }
    doc.set_hidden(id, node.hidden);
    if let Some(spec) = &node.layout {
        doc.set_layout(
            id,
            ScrollLayout {
                overflow_y: spec.overflow_y,
                scroll_height: spec.scroll_height,
                client_height: spec.client_height,
                scroll_top: 0.0,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "url": "https://gemini.google.com/app/abc",
        "title": "Sample",
        "root": {
            "tag": "body",
            "children": [
                {"tag": "div", "attrs": {"id": "history"},
                 "layout": {"overflowY": "auto", "scrollHeight": 2000, "clientHeight": 800},
                 "children": [
                    {"tag": "user-query", "text": "Hello there"}
                 ]}
            ]
        },
        "lazyBatches": [{"parent": "history", "height": 500, "nodes": [{"tag": "p", "text": "Older"}]}]
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.title, "Sample");
        assert_eq!(snapshot.viewport, Viewport::default());
        assert_eq!(snapshot.lazy_batches.len(), 1);
        assert_eq!(snapshot.lazy_batches[0].height, 500.0);
    }

    #[test]
    fn test_build_document_keeps_layout_and_text() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        let doc = snapshot.build_document().unwrap();
        let history = doc.find_by_id("history").unwrap();
        let layout = doc.layout(history).unwrap();
        assert_eq!(layout.overflow_y, Overflow::Auto);
        assert_eq!(layout.overflow_extent(), 1200.0);
        assert_eq!(doc.detached_text(history), "Hello there");
    }

    #[test]
    fn test_text_root_rejected() {
        let json = r#"{"url": "https://gemini.google.com/app", "root": {"text": "bare"}}"#;
        let err = Snapshot::from_json(json).unwrap_err();
        assert!(matches!(err, ExportError::Snapshot(_)));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = Snapshot::from_json("{not json").unwrap_err();
        assert!(matches!(err, ExportError::Serialization(_)));
    }
}
