use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use super::document::{Document, NodeId, Overflow, ScrollLayout};
use super::snapshot::{LazyBatch, Snapshot, build_node};
use crate::error::{ExportError, ExportResult};

/// Which box a scroll operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// The document's own scrolling element
    Root,
    Element(NodeId),
}

/// The live page the extractor drives.
///
/// Implementations own the DOM and its scroll state. The extractor only
/// suspends inside [`Page::wait`].
pub trait Page {
    fn url(&self) -> &str;
    fn title(&self) -> String;
    fn document(&self) -> &Document;
    fn viewport_height(&self) -> f64;
    fn scroll_metrics(&self, target: ScrollTarget) -> ScrollLayout;
    fn scroll_to(&mut self, target: ScrollTarget, top: f64);
    /// Fire a synthetic scroll notification at `target`
    fn dispatch_scroll(&mut self, target: ScrollTarget);
    fn click(&mut self, node: NodeId) -> ExportResult<()>;
    fn wait(&mut self, duration: Duration);
}

/// Page replayed from a [`Snapshot`].
///
/// Lazy batches load one at a time when a scroll notification reaches a
/// container sitting at its top boundary. Waiting is simulated and only
/// accumulated in [`SnapshotPage::waited`].
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    url: String,
    title: String,
    viewport_height: f64,
    document: Document,
    root_layout: ScrollLayout,
    pending: VecDeque<LazyBatch>,
    batches_loaded: usize,
    clicks: usize,
    waited: Duration,
}

impl SnapshotPage {
    pub fn from_snapshot(snapshot: Snapshot) -> ExportResult<Self> {
        let document = snapshot.build_document()?;
        let viewport_height = snapshot.viewport.height;
        Ok(Self {
            url: snapshot.url,
            title: snapshot.title,
            viewport_height,
            document,
            root_layout: ScrollLayout {
                overflow_y: Overflow::Auto,
                scroll_height: viewport_height,
                client_height: viewport_height,
                scroll_top: 0.0,
            },
            pending: snapshot.lazy_batches.into(),
            batches_loaded: 0,
            clicks: 0,
            waited: Duration::ZERO,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let snapshot = Snapshot::load(path)?;
        Ok(Self::from_snapshot(snapshot)?)
    }

    pub fn batches_loaded(&self) -> usize {
        self.batches_loaded
    }

    pub fn pending_batches(&self) -> usize {
        self.pending.len()
    }

    pub fn clicks(&self) -> usize {
        self.clicks
    }

    pub fn waited(&self) -> Duration {
        self.waited
    }

    fn layout_mut(&mut self, target: ScrollTarget) -> Option<&mut ScrollLayout> {
        match target {
            ScrollTarget::Root => Some(&mut self.root_layout),
            ScrollTarget::Element(id) => self.document.element_mut(id)?.layout.as_mut(),
        }
    }

    fn load_next_batch(&mut self, target: ScrollTarget) {
        let Some(batch) = self.pending.pop_front() else {
            return;
        };
        let parent = self
            .document
            .find_by_id(&batch.parent)
            .or(match target {
                ScrollTarget::Element(id) => Some(id),
                ScrollTarget::Root => None,
            })
            .unwrap_or_else(|| self.document.root());

        for (index, node) in batch.nodes.iter().enumerate() {
            let id = build_node(&mut self.document, node);
            self.document.insert_child(parent, index, id);
        }
        if let Some(layout) = self.layout_mut(target) {
            layout.scroll_height += batch.height;
        }
        self.batches_loaded += 1;
        debug!(batch = self.batches_loaded, nodes = batch.nodes.len(), "Loaded lazy batch");
    }
}

impl Page for SnapshotPage {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn document(&self) -> &Document {
        &self.document
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn scroll_metrics(&self, target: ScrollTarget) -> ScrollLayout {
        match target {
            ScrollTarget::Root => self.root_layout,
            ScrollTarget::Element(id) => self.document.layout(id).unwrap_or_default(),
        }
    }

    fn scroll_to(&mut self, target: ScrollTarget, top: f64) {
        if let Some(layout) = self.layout_mut(target) {
            layout.scroll_top = top.clamp(0.0, layout.overflow_extent());
        }
    }

    fn dispatch_scroll(&mut self, target: ScrollTarget) {
        if self.scroll_metrics(target).scroll_top <= 0.0 {
            self.load_next_batch(target);
        }
    }

    fn click(&mut self, node: NodeId) -> ExportResult<()> {
        if self.document.element(node).is_none() {
            return Err(ExportError::Page(format!("no element with node id {}", node.0)));
        }
        self.clicks += 1;

        if let Some(target) = self.document.attr(node, "aria-controls").map(str::to_string)
            && let Some(controlled) = self.document.find_by_id(&target)
        {
            self.document.set_hidden(controlled, false);
        }

        if self.document.attr(node, "aria-expanded").is_some() {
            self.document.set_attr(node, "aria-expanded", "true");
            return Ok(());
        }

        // Truncation markers drop off once expanded; standalone controls disappear
        let remaining: Vec<String> = self
            .document
            .class_tokens(node)
            .filter(|c| !(c.contains("truncat") || c.contains("show-more") || c.contains("expand")))
            .map(str::to_string)
            .collect();
        self.document.set_attr(node, "class", &remaining.join(" "));
        let is_control = self.document.tag(node) == Some("button")
            || self.document.attr(node, "role") == Some("button");
        if is_control {
            self.document.set_hidden(node, true);
        }
        Ok(())
    }

    fn wait(&mut self, duration: Duration) {
        self.waited += duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json: &str) -> SnapshotPage {
        SnapshotPage::from_snapshot(Snapshot::from_json(json).unwrap()).unwrap()
    }

    const LAZY: &str = r#"{
        "url": "https://gemini.google.com/app/x",
        "root": {"tag": "body", "children": [
            {"tag": "div", "attrs": {"id": "history"},
             "layout": {"overflowY": "auto", "scrollHeight": 1000, "clientHeight": 500},
             "children": [{"tag": "p", "text": "Newest"}]}
        ]},
        "lazyBatches": [
            {"parent": "history", "height": 400, "nodes": [{"tag": "p", "text": "Older"}]},
            {"parent": "history", "height": 400, "nodes": [{"tag": "p", "text": "Oldest"}]}
        ]
    }"#;

    #[test]
    fn test_scroll_at_top_loads_batches_in_order() {
        let mut page = page(LAZY);
        let history = page.document().find_by_id("history").unwrap();
        let target = ScrollTarget::Element(history);

        page.dispatch_scroll(target);
        page.dispatch_scroll(target);
        page.dispatch_scroll(target);

        assert_eq!(page.batches_loaded(), 2);
        assert_eq!(page.scroll_metrics(target).scroll_height, 1800.0);
        assert_eq!(page.document().detached_text(history), "OldestOlderNewest");
    }

    #[test]
    fn test_scroll_away_from_top_does_not_load() {
        let mut page = page(LAZY);
        let history = page.document().find_by_id("history").unwrap();
        let target = ScrollTarget::Element(history);

        page.scroll_to(target, 300.0);
        page.dispatch_scroll(target);
        assert_eq!(page.batches_loaded(), 0);
        assert_eq!(page.scroll_metrics(target).scroll_top, 300.0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut page = page(LAZY);
        let history = page.document().find_by_id("history").unwrap();
        let target = ScrollTarget::Element(history);
        page.scroll_to(target, 10_000.0);
        assert_eq!(page.scroll_metrics(target).scroll_top, 500.0);
        page.scroll_to(target, -5.0);
        assert_eq!(page.scroll_metrics(target).scroll_top, 0.0);
    }

    #[test]
    fn test_click_expands_aria_controls() {
        let mut page = page(
            r#"{"url": "https://gemini.google.com/app/x", "root": {"tag": "body", "children": [
                {"tag": "button", "attrs": {"aria-expanded": "false", "aria-controls": "more"}, "text": "Show more"},
                {"tag": "div", "attrs": {"id": "more"}, "hidden": true, "text": "Hidden detail"}
            ]}}"#,
        );
        let button = page.document().elements()[1];
        page.click(button).unwrap();

        let more = page.document().find_by_id("more").unwrap();
        assert!(page.document().is_visible(more));
        assert_eq!(page.document().attr(button, "aria-expanded"), Some("true"));
        assert_eq!(page.clicks(), 1);
    }

    #[test]
    fn test_click_unknown_node_fails() {
        let mut page = page(LAZY);
        assert!(matches!(page.click(NodeId(999)), Err(ExportError::Page(_))));
    }

    #[test]
    fn test_wait_is_simulated() {
        let mut page = page(LAZY);
        page.wait(Duration::from_millis(250));
        page.wait(Duration::from_millis(250));
        assert_eq!(page.waited(), Duration::from_millis(500));
    }
}
