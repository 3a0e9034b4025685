use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Loading,
    Expanding,
    Extracting,
}

/// Transient status update sent while an extraction runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub message: String,
    pub iteration: usize,
}

impl ProgressEvent {
    pub fn new(status: ProgressStatus, message: impl Into<String>, iteration: usize) -> Self {
        Self { status, message: message.into(), iteration }
    }
}

/// Receiver of progress events.
///
/// Sending never fails: a consumer that has gone away simply misses events.
pub trait ProgressSink {
    fn send(&mut self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent),
{
    fn send(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Sink that discards everything
pub struct NullSink;

impl ProgressSink for NullSink {
    fn send(&mut self, _event: ProgressEvent) {}
}
