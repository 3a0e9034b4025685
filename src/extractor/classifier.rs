//! Speaker role inference.
//!
//! Precedence, strongest first:
//! 1. explicit author attribute (`data-message-author-role`, `role`)
//! 2. test-id, class or tag hint on the element or its nearest ancestors
//! 3. the opposite of the immediately preceding sibling's role
//! 4. short text shaped like a question or instruction means the user
//! 5. the assistant
//!
//! Short ambiguous messages can still be mis-tagged; the heuristics only
//! narrow that down.

use std::collections::HashMap;

use crate::config::ScanPolicy;
use crate::dom::{Document, NodeId};
use crate::models::Role;

pub const AUTHOR_ROLE_ATTR: &str = "data-message-author-role";

const USER_WORDS: &[&str] = &["user", "query", "human", "prompt", "request"];
const ASSISTANT_WORDS: &[&str] = &["model", "response", "assistant", "bot", "gemini", "answer"];
const TEST_ID_ATTRS: &[&str] = &["data-test-id", "data-testid"];

const OPENERS: &[&str] = &[
    "how", "what", "why", "when", "where", "who", "which", "can", "could", "would", "should",
    "please", "write", "explain", "tell", "help", "give", "create", "make", "show", "list",
    "summarize", "translate", "describe", "generate", "find",
];

/// Map an attribute value such as `user`, `model` or `assistant` to a role
pub fn parse_role_value(value: &str) -> Option<Role> {
    match value.trim().to_ascii_lowercase().as_str() {
        "user" | "human" => Some(Role::User),
        "model" | "assistant" | "bot" => Some(Role::Assistant),
        _ => None,
    }
}

/// Role stated outright by the element's own attributes
pub fn explicit_role(doc: &Document, id: NodeId) -> Option<Role> {
    doc.attr(id, AUTHOR_ROLE_ATTR)
        .and_then(parse_role_value)
        .or_else(|| doc.attr(id, "role").and_then(parse_role_value))
}

/// Role implied by a name such as `user-query` or `modelResponse`
pub fn role_from_name(name: &str) -> Option<Role> {
    let words: Vec<String> = split_words(name);
    if words.iter().any(|w| USER_WORDS.contains(&w.as_str())) {
        Some(Role::User)
    } else if words.iter().any(|w| ASSISTANT_WORDS.contains(&w.as_str())) {
        Some(Role::Assistant)
    } else {
        None
    }
}

fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        // camelCase boundary
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn hint_on(doc: &Document, id: NodeId) -> Option<Role> {
    TEST_ID_ATTRS
        .iter()
        .filter_map(|attr| doc.attr(id, attr))
        .find_map(role_from_name)
        .or_else(|| doc.class_tokens(id).find_map(role_from_name))
        .or_else(|| doc.tag(id).and_then(role_from_name))
}

/// Hint on the element, then on up to `depth` ancestors
pub fn marked_role(doc: &Document, id: NodeId, depth: usize) -> Option<Role> {
    std::iter::once(id).chain(doc.ancestors(id).take(depth)).find_map(|n| hint_on(doc, n))
}

/// Whether the text reads like something a person would type as a prompt
pub fn looks_like_user_text(text: &str, max_chars: usize) -> bool {
    if text.chars().count() > max_chars {
        return false;
    }
    if text.contains('?') {
        return true;
    }
    text.split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .is_some_and(|w| OPENERS.contains(&w.as_str()))
}

/// Assign a role to one scanned element.
///
/// `classified` holds the roles given to elements earlier in the same scan.
pub fn classify(
    doc: &Document,
    id: NodeId,
    text: &str,
    classified: &HashMap<NodeId, Role>,
    policy: &ScanPolicy,
) -> Role {
    if let Some(role) = explicit_role(doc, id) {
        return role;
    }
    if let Some(role) = marked_role(doc, id, policy.ancestor_depth) {
        return role;
    }
    if let Some(role) = doc.prev_element_sibling(id).and_then(|s| classified.get(&s)) {
        return role.opposite();
    }
    if looks_like_user_text(text, policy.short_text_chars) {
        return Role::User;
    }
    Role::Assistant
}
