//! Message-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::store::Attachment;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    User,
    Assistant,
}

/// A message packaged for the send collaborator: text plus every attachment
/// pending at submit time. Consumed immediately; not retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    /// Eligible for send: non-blank text or at least one attachment.
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty() || !self.attachments.is_empty()
    }
}

/// A message in the session transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn from_outgoing(message: OutgoingMessage) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: Sender::User,
            text: message.text,
            attachments: message.attachments,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: Sender::Assistant,
            text: text.into(),
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
