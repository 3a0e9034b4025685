//! Collapse repeated captures of the same message.
//!
//! The first occurrence always wins. With the default prefix key two long
//! messages sharing their opening characters collapse into one; switch
//! `dedup.key` to `full` to keep them apart.

use std::collections::HashSet;

use crate::config::{DedupKey, DedupPolicy};
use crate::models::{Message, Role};

/// How overlapping entries are detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Drop entries whose key equals a kept key
    Exact,
    /// Also drop entries containing, or contained in, a kept entry of the same role
    Containment,
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    policy: DedupPolicy,
    mode: DedupMode,
}

impl Deduplicator {
    pub fn new(policy: DedupPolicy, mode: DedupMode) -> Self {
        Self { policy, mode }
    }

    fn key(&self, message: &Message) -> (Option<Role>, String) {
        let content = message.content.trim();
        let text = match self.policy.key {
            DedupKey::Prefix => content.chars().take(self.policy.prefix_chars).collect(),
            DedupKey::Full => content.to_string(),
        };
        let role = self.policy.include_role.then_some(message.role);
        (role, text)
    }

    /// Keep the first of every group of duplicates, preserving order
    pub fn dedup(&self, messages: Vec<Message>) -> Vec<Message> {
        let mut seen = HashSet::new();
        let mut kept: Vec<Message> = Vec::with_capacity(messages.len());

        for message in messages {
            if !seen.insert(self.key(&message)) {
                continue;
            }
            if self.mode == DedupMode::Containment && self.overlaps_kept(&message, &kept) {
                continue;
            }
            kept.push(message);
        }

        kept
    }

    fn overlaps_kept(&self, message: &Message, kept: &[Message]) -> bool {
        let content = message.content.trim();
        kept.iter().any(|k| {
            (!self.policy.include_role || k.role == message.role) && {
                let other = k.content.trim();
                other.contains(content) || content.contains(other)
            }
        })
    }
}
