//! Reveal collapsed content ("show more", truncated blocks) before scanning.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::ExpanderPolicy;
use crate::dom::{Document, NodeId, Page};
use crate::error::ExportResult;
use crate::models::{ProgressEvent, ProgressSink, ProgressStatus};

const CLASS_HINTS: &[&str] = &["expand", "truncat", "show-more"];
const LABEL_PHRASES: &[&str] = &["show more", "read more", "see more", "expand"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpandReport {
    pub passes: usize,
    pub expanded: usize,
}

fn is_button_like(doc: &Document, id: NodeId) -> bool {
    doc.tag(id) == Some("button") || doc.attr(id, "role") == Some("button")
}

fn has_class_hint(doc: &Document, id: NodeId) -> bool {
    doc.class_tokens(id).any(|c| {
        let c = c.to_ascii_lowercase();
        !c.contains("expanded") && CLASS_HINTS.iter().any(|h| c.contains(h))
    })
}

/// Whether `id` looks like a control that reveals more content
pub fn is_expandable(doc: &Document, id: NodeId, max_label_chars: usize) -> bool {
    if !doc.is_visible(id) {
        return false;
    }
    match doc.attr(id, "aria-expanded") {
        Some("true") => return false,
        Some("false") => return true,
        _ => {}
    }
    if has_class_hint(doc, id) {
        return true;
    }
    if is_button_like(doc, id) {
        let label = doc.detached_text(id).to_lowercase();
        return label.chars().count() <= max_label_chars
            && LABEL_PHRASES.iter().any(|p| label.contains(p));
    }
    false
}

/// Clicks expandable controls until a pass finds nothing new
pub struct TruncationExpander<'a> {
    policy: &'a ExpanderPolicy,
}

impl<'a> TruncationExpander<'a> {
    pub fn new(policy: &'a ExpanderPolicy) -> Self {
        Self { policy }
    }

    /// `clicked` carries the nodes already activated in this session
    pub fn expand<P: Page + ?Sized>(
        &self,
        page: &mut P,
        clicked: &mut HashSet<NodeId>,
        sink: &mut dyn ProgressSink,
    ) -> ExportResult<ExpandReport> {
        let mut report = ExpandReport::default();

        while report.passes < self.policy.max_passes {
            report.passes += 1;
            let candidates: Vec<NodeId> = {
                let doc = page.document();
                doc.elements()
                    .into_iter()
                    .filter(|id| !clicked.contains(id))
                    .filter(|id| is_expandable(doc, *id, self.policy.max_label_chars))
                    .collect()
            };

            let mut expanded_this_pass = 0;
            for id in candidates {
                // An earlier click in this pass may have hidden or expanded it
                if !is_expandable(page.document(), id, self.policy.max_label_chars) {
                    continue;
                }
                page.click(id)?;
                page.wait(self.policy.click_pause());
                clicked.insert(id);
                expanded_this_pass += 1;
            }

            report.expanded += expanded_this_pass;
            debug!(pass = report.passes, expanded = expanded_this_pass, "Expansion pass");
            sink.send(ProgressEvent::new(
                ProgressStatus::Expanding,
                format!("Expanded {} truncated sections", report.expanded),
                report.passes,
            ));

            if expanded_this_pass == 0 {
                break;
            }
        }

        info!(passes = report.passes, expanded = report.expanded, "Expansion finished");
        Ok(report)
    }
}
