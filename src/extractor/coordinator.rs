//! Sequencing of one export request.
//!
//! `idle → loading → expanding → extracting → done`, or `failed` as soon as
//! any stage errors. A failed run returns no partial data.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};
use url::Url;

use super::expander::{ExpandReport, TruncationExpander};
use super::loader::{HistoryLoader, LoadReport};
use super::scanner::MessageScanner;
use crate::config::{ExporterConfig, SiteConfig};
use crate::dom::{NodeId, Page};
use crate::error::{ExportError, ExportResult};
use crate::models::{ExtractionResult, ProgressEvent, ProgressSink, ProgressStatus, Request, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Loading,
    Expanding,
    Extracting,
    Done,
    Failed,
}

impl ExtractionState {
    fn progress_status(self) -> Option<ProgressStatus> {
        match self {
            ExtractionState::Loading => Some(ProgressStatus::Loading),
            ExtractionState::Expanding => Some(ProgressStatus::Expanding),
            ExtractionState::Extracting => Some(ProgressStatus::Extracting),
            _ => None,
        }
    }
}

/// Reject pages outside the configured hosts before touching them
pub fn check_page(url: &str, site: &SiteConfig) -> ExportResult<()> {
    let parsed = Url::parse(url).map_err(|_| ExportError::UnsupportedPage(url.to_string()))?;
    let host = parsed.host_str().unwrap_or_default();
    let allowed = site.hosts.iter().map(|h| h.trim().to_ascii_lowercase()).any(|h| {
        host == h || host.strip_suffix(h.as_str()).is_some_and(|rest| rest.ends_with('.'))
    });
    if allowed { Ok(()) } else { Err(ExportError::UnsupportedPage(url.to_string())) }
}

/// Everything one extraction invocation needs, and nothing shared.
pub struct ExtractionSession<'a> {
    config: &'a ExporterConfig,
    sink: &'a mut dyn ProgressSink,
    clicked: HashSet<NodeId>,
    states: Vec<ExtractionState>,
    load_report: Option<LoadReport>,
    expand_report: Option<ExpandReport>,
    strategy: Option<&'static str>,
}

impl<'a> ExtractionSession<'a> {
    pub fn new(config: &'a ExporterConfig, sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            config,
            sink,
            clicked: HashSet::new(),
            states: vec![ExtractionState::Idle],
            load_report: None,
            expand_report: None,
            strategy: None,
        }
    }

    pub fn state(&self) -> ExtractionState {
        self.states.last().copied().unwrap_or(ExtractionState::Idle)
    }

    /// Every state the session has been in, oldest first
    pub fn states(&self) -> &[ExtractionState] {
        &self.states
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        self.load_report.as_ref()
    }

    pub fn expand_report(&self) -> Option<ExpandReport> {
        self.expand_report
    }

    /// Name of the scan strategy that produced the messages
    pub fn strategy(&self) -> Option<&'static str> {
        self.strategy
    }

    fn transition(&mut self, next: ExtractionState, message: &str) {
        info!(from = ?self.state(), to = ?next, "Extraction state change");
        self.states.push(next);
        if let Some(status) = next.progress_status() {
            self.sink.send(ProgressEvent::new(status, message, 0));
        }
    }

    /// Run every stage against `page`
    pub fn run<P: Page + ?Sized>(&mut self, page: &mut P) -> ExportResult<ExtractionResult> {
        if self.state() != ExtractionState::Idle {
            return Err(ExportError::SessionUsed);
        }
        match self.run_stages(page) {
            Ok(result) => {
                self.transition(ExtractionState::Done, "Done");
                info!(messages = result.message_count, "Extraction complete");
                Ok(result)
            }
            Err(e) => {
                self.transition(ExtractionState::Failed, "Failed");
                warn!(error = %e, "Extraction failed");
                Err(e)
            }
        }
    }

    fn run_stages<P: Page + ?Sized>(&mut self, page: &mut P) -> ExportResult<ExtractionResult> {
        let config = self.config;
        check_page(page.url(), &config.site)?;

        self.transition(ExtractionState::Loading, "Loading conversation history...");
        let load = HistoryLoader::new(&config.loader).load(page, &mut *self.sink);
        self.load_report = Some(load);

        self.transition(ExtractionState::Expanding, "Expanding truncated messages...");
        let expand = TruncationExpander::new(&config.expander).expand(
            page,
            &mut self.clicked,
            &mut *self.sink,
        )?;
        self.expand_report = Some(expand);

        self.transition(ExtractionState::Extracting, "Extracting messages...");
        let scanner = MessageScanner::new(config.scanner.clone(), config.dedup.clone());
        let now = Utc::now();
        let outcome = scanner.scan(page.document(), now);
        self.strategy = outcome.strategy;

        let title = page.title().trim().to_string();
        let title = if title.is_empty() { config.site.default_title.clone() } else { title };
        Ok(ExtractionResult::new(title, outcome.messages, now))
    }

    /// Answer one protocol request
    pub fn handle<P: Page + ?Sized>(&mut self, request: &Request, page: &mut P) -> Response {
        match request {
            Request::ExtractChat => match self.run(page) {
                Ok(result) => Response::success(result),
                Err(e) => Response::failure(e.to_string()),
            },
        }
    }
}

/// Run one extraction with a fresh session
pub fn extract_chat<P: Page + ?Sized>(
    page: &mut P,
    config: &ExporterConfig,
    sink: &mut dyn ProgressSink,
) -> ExportResult<ExtractionResult> {
    ExtractionSession::new(config, sink).run(page)
}

/// Answer one protocol request with a fresh session
pub fn handle_request<P: Page + ?Sized>(
    request: &Request,
    page: &mut P,
    config: &ExporterConfig,
    sink: &mut dyn ProgressSink,
) -> Response {
    ExtractionSession::new(config, sink).handle(request, page)
}
