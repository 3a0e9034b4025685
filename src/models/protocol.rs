//! Messages exchanged between the controller and the extractor.

use serde::{Deserialize, Serialize};

use super::{ExtractionResult, ProgressEvent, ProgressStatus};

/// Inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "extractChat")]
    ExtractChat,
}

/// Reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Success { success: SuccessFlag<true>, data: ExtractionResult },
    Failure { success: SuccessFlag<false>, error: String },
}

impl Response {
    pub fn success(data: ExtractionResult) -> Self {
        Response::Success { success: SuccessFlag, data }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Response::Failure { success: SuccessFlag, error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

/// The literal `true` / `false` carried in the `success` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessFlag<const V: bool>;

impl<const V: bool> Serialize for SuccessFlag<V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(V)
    }
}

impl<'de, const V: bool> Deserialize<'de> for SuccessFlag<V> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = bool::deserialize(deserializer)?;
        if value == V {
            Ok(SuccessFlag)
        } else {
            Err(serde::de::Error::custom(format!("expected success = {}", V)))
        }
    }
}

/// Progress notification as it travels on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub action: ProgressAction,
    pub status: ProgressStatus,
    pub message: String,
    pub iteration: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressAction {
    #[serde(rename = "progress")]
    Progress,
}

impl From<ProgressEvent> for ProgressMessage {
    fn from(event: ProgressEvent) -> Self {
        Self {
            action: ProgressAction::Progress,
            status: event.status,
            message: event.message,
            iteration: event.iteration,
        }
    }
}
