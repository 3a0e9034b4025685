use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Index of a node inside a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Computed `overflow-y` of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

impl Overflow {
    pub fn is_scrollable(self) -> bool {
        matches!(self, Overflow::Scroll | Overflow::Auto)
    }
}

/// Scroll geometry of an element, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollLayout {
    pub overflow_y: Overflow,
    pub scroll_height: f64,
    pub client_height: f64,
    pub scroll_top: f64,
}

impl ScrollLayout {
    /// How far the content extends past the visible box
    pub fn overflow_extent(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub hidden: bool,
    pub layout: Option<ScrollLayout>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Tags whose text never reaches the reader
const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Tags that do not start a new line of rendered text
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "i", "kbd", "mark", "q",
    "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Arena-backed element tree.
///
/// Nodes are never removed from the arena; detaching is done by copying
/// (see [`Document::detached_copy`]), so `NodeId`s stay valid for the life of
/// the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document with a single root element
    pub fn new(root_tag: &str) -> Self {
        let root = Node {
            kind: NodeKind::Element(Element {
                tag: root_tag.to_ascii_lowercase(),
                attrs: BTreeMap::new(),
                hidden: false,
                layout: None,
            }),
            parent: None,
            children: Vec::new(),
        };
        Self { nodes: vec![root], root: NodeId(0) }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Create a detached element; attach it with [`Document::append_child`]
    pub fn create_element(&mut self, tag: &str, attrs: BTreeMap<String, String>) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
            hidden: false,
            layout: None,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, parent: None, children: Vec::new() });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.nodes[parent.0].children.len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` at `index` among `parent`'s children (clamped to the end)
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Element ids in document order (pre-order), starting at `from`
    pub fn traverse(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if self.element(id).is_none() {
                continue;
            }
            out.push(id);
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Every element in document order
    pub fn elements(&self) -> Vec<NodeId> {
        self.traverse(self.root)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.iter().copied().filter(move |c| self.element(*c).is_some())
    }

    /// Closest preceding sibling that is an element
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings[..pos].iter().rev().copied().find(|c| self.element(*c).is_some())
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attrs.get(name)).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn class_tokens(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_tokens(id).any(|c| c == class)
    }

    /// First element carrying the given `id` attribute
    pub fn find_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.elements().into_iter().find(|id| self.attr(*id, "id") == Some(html_id))
    }

    /// True unless the element or one of its ancestors is hidden
    pub fn is_visible(&self, id: NodeId) -> bool {
        let hidden = |n: NodeId| self.element(n).is_some_and(|el| el.hidden);
        !hidden(id) && !self.ancestors(id).any(hidden)
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(el) = self.element_mut(id) {
            el.hidden = hidden;
        }
    }

    pub fn layout(&self, id: NodeId) -> Option<ScrollLayout> {
        self.element(id).and_then(|el| el.layout)
    }

    pub fn set_layout(&mut self, id: NodeId, layout: ScrollLayout) {
        if let Some(el) = self.element_mut(id) {
            el.layout = Some(layout);
        }
    }

    /// Copy the subtree rooted at `id` into a standalone document
    pub fn detached_copy(&self, id: NodeId) -> Document {
        let tag = self.tag(id).unwrap_or("div");
        let mut copy = Document::new(tag);
        if let Some(el) = self.element(id) {
            let root = copy.root;
            copy.nodes[root.0].kind = NodeKind::Element(el.clone());
        }
        let root = copy.root;
        for child in &self.nodes[id.0].children {
            self.copy_into(&mut copy, *child, root);
        }
        copy
    }

    fn copy_into(&self, target: &mut Document, id: NodeId, parent: NodeId) {
        let new_id = target.push(self.nodes[id.0].kind.clone());
        target.append_child(parent, new_id);
        for child in &self.nodes[id.0].children {
            self.copy_into(target, *child, new_id);
        }
    }

    /// Unlink every element with one of `tags` from its parent
    pub fn remove_tags(&mut self, tags: &[&str]) {
        for id in self.elements() {
            if id == self.root {
                continue;
            }
            if self.tag(id).is_some_and(|t| tags.contains(&t))
                && let Some(parent) = self.parent(id)
            {
                self.nodes[parent.0].children.retain(|c| *c != id);
                self.nodes[id.0].parent = None;
            }
        }
    }

    /// Raw concatenated text of every descendant text node
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element(_) => {
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Readable text of an element, taken from a detached copy so the live
    /// tree is untouched: non-text tags removed, whitespace collapsed, trimmed
    pub fn detached_text(&self, id: NodeId) -> String {
        let mut copy = self.detached_copy(id);
        copy.remove_tags(NON_TEXT_TAGS);
        collapse_whitespace(&copy.text_content(copy.root))
    }

    /// Visible text of the page broken into rendered lines
    pub fn visible_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        self.collect_lines(self.root, &mut current, &mut lines);
        flush_line(&mut current, &mut lines);
        lines
    }

    fn collect_lines(&self, id: NodeId, current: &mut String, lines: &mut Vec<String>) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => {
                let mut parts = t.split('\n');
                if let Some(first) = parts.next() {
                    current.push_str(first);
                }
                for part in parts {
                    flush_line(current, lines);
                    current.push_str(part);
                }
            }
            NodeKind::Element(el) => {
                if el.hidden || NON_TEXT_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                let block = !INLINE_TAGS.contains(&el.tag.as_str());
                if block {
                    flush_line(current, lines);
                }
                for child in &self.nodes[id.0].children {
                    self.collect_lines(*child, current, lines);
                }
                if block {
                    flush_line(current, lines);
                }
            }
        }
    }

    /// Approximate amount of rendered text, in characters
    pub fn visible_text_len(&self) -> usize {
        self.visible_lines().iter().map(|l| l.chars().count()).sum()
    }
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

/// Collapse every whitespace run to one space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
