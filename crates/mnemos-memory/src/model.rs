//! Session transcript and summary records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form metadata attached to records.
pub type Metadata = Map<String, Value>;

/// A single transcript message. Never mutated once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub uuid: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub token_count: usize,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Message {
    /// Create a message with a fresh id and the current timestamp.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            role: role.into(),
            content: content.into(),
            created_at: Utc::now(),
            token_count: 0,
            metadata: Metadata::new(),
        }
    }

    /// Set the token count computed for this message's content.
    pub fn with_token_count(mut self, token_count: usize) -> Self {
        self.token_count = token_count;
        self
    }
}

/// Running summary of a session's covered messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub uuid: Uuid,
    pub content: String,
    #[serde(default)]
    pub token_count: usize,
    pub created_at: DateTime<Utc>,
    /// Most recent message folded into `content`. Every message up to and
    /// including this one is covered.
    #[serde(rename = "recent_message_uuid")]
    pub summary_point_uuid: Uuid,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Summary {
    /// Create a summary covering messages up to `summary_point_uuid`.
    pub fn new(content: impl Into<String>, token_count: usize, summary_point_uuid: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            content: content.into(),
            token_count,
            created_at: Utc::now(),
            summary_point_uuid,
            metadata: Metadata::new(),
        }
    }
}

/// Snapshot returned by a store read: uncovered messages plus the current summary.
///
/// `messages` is `None` only when a store breaks its contract; callers treat
/// that as an error rather than an empty transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Memory {
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Unit of work handed to extractors when messages are appended.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub session_id: String,
    pub messages: Vec<Message>,
}

impl MessageEvent {
    pub fn new(session_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            session_id: session_id.into(),
            messages,
        }
    }
}

/// Search request over a session's messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchPayload {
    pub text: String,
    /// Reserved for future use.
    #[serde(default)]
    pub meta: Metadata,
}

/// A ranked search hit. Lower `dist` is a closer match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub message: Message,
    /// Reserved for future use.
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub meta: Metadata,
    pub dist: f64,
}
