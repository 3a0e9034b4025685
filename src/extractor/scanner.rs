//! Message scanning.
//!
//! Strategies run in order; the first one that yields anything decides the
//! result:
//!
//! 1. [`RoleMarkedStrategy`] - elements that announce their author
//! 2. [`ContentRegionStrategy`] - self-contained text blocks inside the main region
//! 3. [`FullTextStrategy`] - visible text lines with alternating roles

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::classifier::{self, AUTHOR_ROLE_ATTR};
use super::dedup::{DedupMode, Deduplicator};
use super::text::{extract_text, is_control, is_valid_content};
use crate::config::{DedupPolicy, ScanPolicy};
use crate::dom::{Document, NodeId};
use crate::models::{Message, Role};

const MARKED_TAGS: &[&str] = &["user-query", "model-response"];
const MARKED_CLASSES: &[&str] =
    &["user-query", "model-response", "query-text", "message-content", "response-content"];

const TEXT_TAGS: &[&str] = &[
    "p", "div", "span", "section", "article", "li", "pre", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6",
];
const INLINE_TAGS: &[&str] = &["a", "b", "code", "em", "i", "mark", "small", "span", "strong", "sub", "sup", "u"];
const REGION_WORDS: &[&str] = &["chat", "conversation"];

/// State shared by the strategies of one scan
pub struct ScanContext<'a> {
    pub policy: &'a ScanPolicy,
    pub timestamp: DateTime<Utc>,
    classified: HashMap<NodeId, Role>,
}

impl<'a> ScanContext<'a> {
    pub fn new(policy: &'a ScanPolicy, timestamp: DateTime<Utc>) -> Self {
        Self { policy, timestamp, classified: HashMap::new() }
    }

    /// Classify `id`, remember the role for sibling inference, build the message
    pub fn message(&mut self, doc: &Document, id: NodeId, text: String) -> Message {
        let role = classifier::classify(doc, id, &text, &self.classified, self.policy);
        self.classified.insert(id, role);
        Message::new(role, text, self.timestamp)
    }
}

/// One way of finding messages in a document
pub trait ScanStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Duplicate handling suited to what this strategy captures
    fn dedup_mode(&self) -> DedupMode {
        DedupMode::Exact
    }

    fn attempt(&self, doc: &Document, ctx: &mut ScanContext<'_>) -> Vec<Message>;
}

/// Elements carrying an author attribute or a well-known message tag/class
pub struct RoleMarkedStrategy;

impl RoleMarkedStrategy {
    fn is_marked(doc: &Document, id: NodeId) -> bool {
        doc.attr(id, AUTHOR_ROLE_ATTR).is_some()
            || classifier::explicit_role(doc, id).is_some()
            || doc.tag(id).is_some_and(|t| MARKED_TAGS.contains(&t))
            || doc.class_tokens(id).any(|c| MARKED_CLASSES.contains(&c))
    }
}

impl ScanStrategy for RoleMarkedStrategy {
    fn name(&self) -> &'static str {
        "role-marked"
    }

    fn attempt(&self, doc: &Document, ctx: &mut ScanContext<'_>) -> Vec<Message> {
        let marked: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|id| doc.is_visible(*id) && Self::is_marked(doc, *id))
            .collect();

        // Nested markers describe the same turn; keep the outermost
        let outermost = marked
            .iter()
            .copied()
            .filter(|id| !doc.ancestors(*id).any(|a| Self::is_marked(doc, a)))
            .collect::<Vec<_>>();
        debug!(marked = marked.len(), outermost = outermost.len(), "Role-marked candidates");

        outermost
            .into_iter()
            .filter_map(|id| {
                let text = extract_text(doc, id, ctx.policy.min_content_chars)?;
                Some(ctx.message(doc, id, text))
            })
            .collect()
    }
}

/// Text blocks inside the detected main content region
pub struct ContentRegionStrategy;

impl ContentRegionStrategy {
    /// `main`, `role="main"`, or an element named after the conversation
    pub fn find_region(doc: &Document) -> NodeId {
        let elements = doc.elements();
        let by_tag = elements
            .iter()
            .copied()
            .find(|id| doc.tag(*id) == Some("main") || doc.attr(*id, "role") == Some("main"));
        let by_name = || {
            elements.iter().copied().find(|id| {
                let id_attr = doc.attr(*id, "id").unwrap_or_default().to_lowercase();
                REGION_WORDS.iter().any(|w| id_attr.contains(w))
                    || doc.class_tokens(*id).any(|c| {
                        let c = c.to_lowercase();
                        REGION_WORDS.iter().any(|w| c.contains(w))
                    })
            })
        };
        by_tag.or_else(by_name).unwrap_or_else(|| doc.root())
    }

    /// Characters of text the element holds itself, counting inline markup
    fn own_text_len(doc: &Document, id: NodeId) -> usize {
        let Some(node) = doc.node(id) else {
            return 0;
        };
        let mut own = String::new();
        for child in &node.children {
            match doc.tag(*child) {
                None => own.push_str(&doc.text_content(*child)),
                Some(tag) if INLINE_TAGS.contains(&tag) => {
                    own.push(' ');
                    own.push_str(&doc.detached_text(*child));
                    own.push(' ');
                }
                Some(_) => {}
            }
        }
        crate::dom::collapse_whitespace(&own).chars().count()
    }

    fn is_block_candidate(&self, doc: &Document, id: NodeId, text: &str, policy: &ScanPolicy) -> bool {
        let len = text.chars().count();
        if len < policy.min_content_chars || len > policy.max_block_chars {
            return false;
        }
        let has_block_children = doc
            .element_children(id)
            .any(|c| doc.tag(c).is_some_and(|t| !INLINE_TAGS.contains(&t)));
        if !has_block_children {
            return true;
        }
        Self::own_text_len(doc, id) as f64 >= policy.own_text_ratio * len as f64
    }

    /// A span inside another text block is part of that block's text
    fn is_inline_fragment(doc: &Document, id: NodeId, region: NodeId) -> bool {
        doc.tag(id) == Some("span")
            && doc
                .ancestors(id)
                .take_while(|a| *a != region)
                .any(|a| doc.tag(a).is_some_and(|t| t != "span" && TEXT_TAGS.contains(&t)))
    }
}

impl ScanStrategy for ContentRegionStrategy {
    fn name(&self) -> &'static str {
        "content-region"
    }

    fn dedup_mode(&self) -> DedupMode {
        DedupMode::Containment
    }

    fn attempt(&self, doc: &Document, ctx: &mut ScanContext<'_>) -> Vec<Message> {
        let region = Self::find_region(doc);
        debug!(region = ?doc.tag(region), "Scanning content region");

        let mut messages = Vec::new();
        for id in doc.traverse(region).into_iter().skip(1) {
            if !doc.is_visible(id)
                || !doc.tag(id).is_some_and(|t| TEXT_TAGS.contains(&t))
                || doc.ancestors(id).any(|a| is_control(doc, a))
                || Self::is_inline_fragment(doc, id, region)
            {
                continue;
            }
            let Some(text) = extract_text(doc, id, ctx.policy.min_content_chars) else {
                continue;
            };
            if self.is_block_candidate(doc, id, &text, ctx.policy) {
                messages.push(ctx.message(doc, id, text));
            }
        }
        messages
    }
}

/// Last resort: every visible line of the page, alternating user/assistant
pub struct FullTextStrategy;

impl ScanStrategy for FullTextStrategy {
    fn name(&self) -> &'static str {
        "full-text"
    }

    fn attempt(&self, doc: &Document, ctx: &mut ScanContext<'_>) -> Vec<Message> {
        let mut role = Role::User;
        let mut messages = Vec::new();
        for line in doc.visible_lines() {
            if !is_valid_content(&line, ctx.policy.min_content_chars) {
                continue;
            }
            messages.push(Message::new(role, line, ctx.timestamp));
            role = role.opposite();
        }
        messages
    }
}

/// What a scan produced and which strategy produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub strategy: Option<&'static str>,
    pub messages: Vec<Message>,
}

/// Runs the strategy cascade and deduplicates the winner's output
pub struct MessageScanner {
    strategies: Vec<Box<dyn ScanStrategy>>,
    policy: ScanPolicy,
    dedup: DedupPolicy,
}

impl MessageScanner {
    pub fn new(policy: ScanPolicy, dedup: DedupPolicy) -> Self {
        Self::with_strategies(
            policy,
            dedup,
            vec![
                Box::new(RoleMarkedStrategy),
                Box::new(ContentRegionStrategy),
                Box::new(FullTextStrategy),
            ],
        )
    }

    pub fn with_strategies(
        policy: ScanPolicy,
        dedup: DedupPolicy,
        strategies: Vec<Box<dyn ScanStrategy>>,
    ) -> Self {
        Self { strategies, policy, dedup }
    }

    pub fn scan(&self, doc: &Document, timestamp: DateTime<Utc>) -> ScanOutcome {
        for strategy in &self.strategies {
            let mut ctx = ScanContext::new(&self.policy, timestamp);
            let found = strategy.attempt(doc, &mut ctx);
            if found.is_empty() {
                debug!(strategy = strategy.name(), "Strategy found nothing");
                continue;
            }
            let raw = found.len();
            let messages =
                Deduplicator::new(self.dedup.clone(), strategy.dedup_mode()).dedup(found);
            info!(strategy = strategy.name(), raw, kept = messages.len(), "Scanned messages");
            return ScanOutcome { strategy: Some(strategy.name()), messages };
        }
        info!("No strategy found any messages");
        ScanOutcome { strategy: None, messages: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Snapshot;

    fn doc(root_children: &str) -> Document {
        let json = format!(
            r#"{{"url": "https://gemini.google.com/app/t", "root": {{"tag": "body", "children": [{}]}}}}"#,
            root_children
        );
        Snapshot::from_json(&json).unwrap().build_document().unwrap()
    }

    fn scan(doc: &Document) -> ScanOutcome {
        MessageScanner::new(ScanPolicy::default(), DedupPolicy::default()).scan(doc, Utc::now())
    }

    #[test]
    fn test_marked_example_conversation() {
        let doc = doc(
            r#"{"tag": "div", "attrs": {"data-message-author-role": "user"}, "text": "Hello there"},
               {"tag": "div", "attrs": {"role": "model"}, "text": "Hi! How can I help?"}"#,
        );
        let outcome = scan(&doc);
        assert_eq!(outcome.strategy, Some("role-marked"));
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].role, Role::User);
        assert_eq!(outcome.messages[0].content, "Hello there");
        assert_eq!(outcome.messages[1].role, Role::Assistant);
        assert_eq!(outcome.messages[1].content, "Hi! How can I help?");
    }

    #[test]
    fn test_nested_markers_count_once() {
        let doc = doc(
            r#"{"tag": "user-query", "children": [
                   {"tag": "div", "attrs": {"class": "query-text"}, "text": "Plan a weekend in Lisbon"}
               ]},
               {"tag": "model-response", "children": [
                   {"tag": "div", "attrs": {"class": "message-content"}, "text": "Day one: Alfama and the castle."}
               ]}"#,
        );
        let outcome = scan(&doc);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].role, Role::User);
        assert_eq!(outcome.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_hidden_and_noise_elements_skipped() {
        let doc = doc(
            r#"{"tag": "div", "attrs": {"class": "message-content"}, "text": "Copy"},
               {"tag": "div", "attrs": {"class": "message-content"}, "hidden": true, "text": "Secret draft text"},
               {"tag": "div", "attrs": {"class": "message-content"}, "text": "Real reply text"}"#,
        );
        let outcome = scan(&doc);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].content, "Real reply text");
    }

    #[test]
    fn test_content_region_fallback_uses_blocks() {
        let doc = doc(
            r#"{"tag": "nav", "children": [{"tag": "p", "text": "Sidebar recent chats"}]},
               {"tag": "main", "children": [
                   {"tag": "div", "children": [
                       {"tag": "p", "text": "How do I boil an egg?"},
                       {"tag": "p", "children": [
                           {"text": "Place it in "},
                           {"tag": "strong", "text": "boiling"},
                           {"text": " water for nine minutes."}
                       ]}
                   ]}
               ]}"#,
        );
        let outcome = scan(&doc);
        assert_eq!(outcome.strategy, Some("content-region"));
        let contents: Vec<&str> = outcome.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["How do I boil an egg?", "Place it in boiling water for nine minutes."]
        );
        assert_eq!(outcome.messages[0].role, Role::User);
        assert_eq!(outcome.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_content_region_takes_standalone_spans() {
        let doc = doc(
            r#"{"tag": "main", "children": [
                   {"tag": "span", "text": "What is a monad?"},
                   {"tag": "p", "children": [
                       {"tag": "span", "text": "A monad wraps"},
                       {"text": " a value with a way to chain computations."}
                   ]}
               ]}"#,
        );
        let outcome = scan(&doc);
        assert_eq!(outcome.strategy, Some("content-region"));
        let contents: Vec<&str> = outcome.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["What is a monad?", "A monad wraps a value with a way to chain computations."]
        );
    }

    #[test]
    fn test_full_text_fallback_alternates_roles() {
        let doc = doc(
            r#"{"text": "First line of chat\nSecond line of chat\nok\nThird line of chat"}"#,
        );
        let outcome = scan(&doc);
        assert_eq!(outcome.strategy, Some("full-text"));
        let roles: Vec<Role> = outcome.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let doc = doc(r#"{"tag": "div", "children": [{"tag": "script", "text": "window.x = 1"}]}"#);
        let outcome = scan(&doc);
        assert_eq!(outcome.strategy, None);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_duplicates_removed_after_scan() {
        let doc = doc(
            r#"{"tag": "div", "attrs": {"data-message-author-role": "model"}, "text": "Repeated answer"},
               {"tag": "div", "attrs": {"data-message-author-role": "model"}, "text": "Repeated answer"}"#,
        );
        assert_eq!(scan(&doc).messages.len(), 1);
    }
}
