//! Message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// The customer on the messaging channel
    Client,
    /// Automated assistant or system notice
    Bot,
    /// Human operator
    Agent,
}

impl SenderRole {
    /// Map a backend sender type onto a role.
    ///
    /// Anything that is neither a customer nor an automated sender is
    /// attributed to an agent.
    pub fn normalize(raw: &str) -> Self {
        let raw = raw.trim().to_lowercase();
        match raw.as_str() {
            "client" | "cliente" | "contact" => SenderRole::Client,
            "bot" | "ia" | "ai" | "sistema" | "system" => SenderRole::Bot,
            _ => SenderRole::Agent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub media_type: String,
    pub url: String,
}

/// A single message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: SenderRole,
    /// `None` when the backend sent no timestamp or one we could not parse
    pub timestamp: Option<DateTime<Utc>>,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub delivery: Option<DeliveryStatus>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn text(
        id: impl Into<String>,
        sender: SenderRole,
        timestamp: Option<DateTime<Utc>>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender,
            timestamp,
            content: content.into(),
            kind: MessageKind::Text,
            delivery: None,
            attachments: Vec::new(),
        }
    }

    pub fn is_from_client(&self) -> bool {
        self.sender == SenderRole::Client
    }
}
