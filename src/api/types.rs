//! Backend wire types and their mapping onto the domain model

use crate::conversation::{
    Attachment, Conversation, Customer, DeliveryStatus, Message, MessageKind, SenderRole,
};
use crate::status::{ConversationStatus, StatusCode};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChangeStatusRequest {
    pub status: ConversationStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignConversationRequest {
    pub agent_ids: Vec<String>,
}

/// JSON carried in the `metadata` part of the send form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageMetadata<'a> {
    pub conversation_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
}

/// Paging parameters for the message list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePageRequest {
    pub page: u32,
    pub size: u32,
}

impl MessagePageRequest {
    pub fn query(&self) -> String {
        format!(
            "page={}&size={}&sortBy=createdAt&direction=DESC",
            self.page, self.size
        )
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Spring-style page envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPage<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConversation {
    pub id: String,
    #[serde(default)]
    pub contact: Option<ApiContact>,
    pub status: String,
    #[serde(default)]
    pub agents: Option<Vec<ApiAgent>>,
    #[serde(default)]
    pub last_message: Option<ApiMessage>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContact {
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub messaging_channel: Option<ApiMessagingChannel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessagingChannel {
    #[serde(default)]
    pub external_contact_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAgent {
    pub agent_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sender: Option<ApiMessageSender>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content: Option<ApiMessageContent>,
    #[serde(default)]
    pub file: Option<ApiMessageFile>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessageSender {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessageContent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessageFile {
    pub id: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub storage_uri: Option<String>,
    #[serde(default)]
    pub metadata: Option<ApiFileMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFileMetadata {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================================================
// Mapping
// ============================================================================

/// Parse a backend timestamp.
///
/// Timestamps without an offset are UTC. Unparseable values yield `None`
/// so the window gate can skip them.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    tracing::warn!(timestamp = %raw, "Ignoring malformed message timestamp");
    None
}

fn parse_kind(raw: &str) -> MessageKind {
    match raw.trim().to_lowercase().as_str() {
        "text" => MessageKind::Text,
        "image" => MessageKind::Image,
        "video" => MessageKind::Video,
        "audio" => MessageKind::Audio,
        "document" => MessageKind::Document,
        "sticker" => MessageKind::Sticker,
        _ => MessageKind::Other,
    }
}

fn parse_delivery(raw: &str) -> Option<DeliveryStatus> {
    match raw.trim().to_lowercase().as_str() {
        "sent" => Some(DeliveryStatus::Sent),
        "delivered" => Some(DeliveryStatus::Delivered),
        "read" => Some(DeliveryStatus::Read),
        "failed" => Some(DeliveryStatus::Failed),
        _ => None,
    }
}

impl ApiMessage {
    pub fn into_message(self) -> Message {
        let sender = self
            .sender
            .and_then(|s| s.kind)
            .map_or(SenderRole::Agent, |kind| SenderRole::normalize(&kind));
        let content = self.content.unwrap_or_default();
        let attachments = self
            .file
            .map(|file| {
                let meta = file.metadata;
                Attachment {
                    name: meta
                        .as_ref()
                        .and_then(|m| m.filename.clone())
                        .unwrap_or_else(|| file.id.clone()),
                    media_type: meta
                        .and_then(|m| m.mime_type)
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    url: file.file_url.or(file.storage_uri).unwrap_or_default(),
                    id: file.id,
                }
            })
            .into_iter()
            .collect();

        Message {
            id: self
                .id
                .unwrap_or_else(|| format!("local-{}", uuid::Uuid::new_v4())),
            sender,
            timestamp: self.created_at.as_deref().and_then(parse_timestamp),
            content: content.text.or(content.caption).unwrap_or_default(),
            kind: self.kind.as_deref().map_or(MessageKind::Text, parse_kind),
            delivery: self.status.as_deref().and_then(parse_delivery),
            attachments,
        }
    }
}

impl ApiConversation {
    pub fn into_conversation(self) -> Conversation {
        let status = StatusCode::from(self.status);
        if status.known().is_none() {
            tracing::warn!(
                conversation_id = %self.id,
                status = %status,
                "Unknown conversation status"
            );
        }

        let customer = self
            .contact
            .map(|contact| Customer {
                id: contact.contact_id.unwrap_or_default(),
                name: contact
                    .full_name
                    .unwrap_or_else(|| "Sin nombre".to_string()),
                phone: contact
                    .messaging_channel
                    .and_then(|c| c.external_contact_id)
                    .unwrap_or_default(),
                email: contact
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("email"))
                    .and_then(Value::as_str)
                    .map(String::from),
            })
            .unwrap_or_default();

        let mut conversation = Conversation::new(self.id, customer, status);
        conversation.created_at = self.created_at.as_deref().and_then(parse_timestamp);
        for agent in self.agents.unwrap_or_default() {
            conversation.assign_agent(agent.agent_id);
        }
        conversation.last_activity = self
            .last_message
            .and_then(|m| m.created_at)
            .as_deref()
            .and_then(parse_timestamp)
            .or(conversation.created_at);
        conversation
    }
}
