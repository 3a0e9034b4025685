//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gemini_chat_exporter::dom::{
    LayoutSpec, LazyBatch, Overflow, Snapshot, SnapshotNode, SnapshotPage, Viewport,
};

pub const GEMINI_URL: &str = "https://gemini.google.com/app/5c1e0d";

/// `id` of the scrollable conversation container
pub const HISTORY_ID: &str = "chat-history";

/// Element node with attributes and optional text
pub fn element(tag: &str, attrs: &[(&str, &str)], text: Option<&str>) -> SnapshotNode {
    SnapshotNode {
        tag: Some(tag.to_string()),
        text: text.map(str::to_string),
        attrs: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        ..SnapshotNode::default()
    }
}

/// Message container marked with `data-message-author-role`
pub fn message(role: &str, text: &str) -> SnapshotNode {
    element("div", &[("data-message-author-role", role)], Some(text))
}

/// Builder for conversation page snapshots
///
/// Messages go into a scrollable `#chat-history` container inside `<main>`.
pub struct SnapshotBuilder {
    url: String,
    title: String,
    nodes: Vec<SnapshotNode>,
    batches: Vec<LazyBatch>,
    scroll_height: f64,
}

impl SnapshotBuilder {
    /// Create a new builder for an empty conversation
    pub fn new() -> Self {
        Self {
            url: GEMINI_URL.to_string(),
            title: "Test Chat".to_string(),
            nodes: Vec::new(),
            batches: Vec::new(),
            scroll_height: 2000.0,
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Add a user turn
    pub fn user(self, text: &str) -> Self {
        self.node(message("user", text))
    }

    /// Add an assistant turn
    pub fn model(self, text: &str) -> Self {
        self.node(message("model", text))
    }

    /// Add an arbitrary node to the conversation container
    pub fn node(mut self, node: SnapshotNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add `count` alternating user/model turns numbered from 1
    pub fn turns(mut self, count: usize) -> Self {
        for i in 1..=count {
            let node = if i % 2 == 1 {
                message("user", &format!("Question number {}?", i))
            } else {
                message("model", &format!("Answer number {} with some detail.", i))
            };
            self.nodes.push(node);
        }
        self
    }

    /// Older turns rendered only after the container is scrolled to the top
    pub fn lazy_batch(mut self, height: f64, nodes: Vec<SnapshotNode>) -> Self {
        self.batches.push(LazyBatch { parent: HISTORY_ID.to_string(), height, nodes });
        self
    }

    pub fn build(self) -> Snapshot {
        let mut history = element("div", &[("id", HISTORY_ID)], None);
        history.layout = Some(LayoutSpec {
            overflow_y: Overflow::Auto,
            scroll_height: self.scroll_height,
            client_height: 800.0,
        });
        history.children = self.nodes;

        let mut main = element("main", &[], None);
        main.children = vec![history];

        Snapshot {
            url: self.url,
            title: self.title,
            viewport: Viewport::default(),
            root: SnapshotNode {
                tag: Some("body".to_string()),
                attrs: BTreeMap::new(),
                children: vec![main],
                ..SnapshotNode::default()
            },
            lazy_batches: self.batches,
        }
    }

    pub fn to_json(self) -> String {
        serde_json::to_string_pretty(&self.build()).expect("Failed to serialize snapshot")
    }

    /// Build a page ready for extraction
    pub fn page(self) -> SnapshotPage {
        SnapshotPage::from_snapshot(self.build()).expect("Failed to build page")
    }

    /// Write the snapshot as `name` inside `dir`
    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, self.to_json()).expect("Failed to write snapshot");
        path
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
