use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inferred speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The other speaker, used when roles are inferred by alternation
    pub fn opposite(self) -> Self {
        match self {
            Role::User => Role::Assistant,
            Role::Assistant => Role::User,
        }
    }

    /// Label used by the text and markdown exports
    pub fn display_label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Gemini",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { role, content: content.into(), timestamp }
    }
}

/// Everything captured by one extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(rename = "exportDate")]
    pub export_date: DateTime<Utc>,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
}

impl ExtractionResult {
    /// Build a result, keeping `message_count` in step with `messages`
    pub fn new(title: impl Into<String>, messages: Vec<Message>, export_date: DateTime<Utc>) -> Self {
        let message_count = messages.len();
        Self { title: title.into(), messages, export_date, message_count }
    }
}
