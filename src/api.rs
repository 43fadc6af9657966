//! Backend API client
//!
//! The backend is the source of truth for conversation status and
//! messages; nothing here re-validates what it decides.

mod client;
mod error;
pub mod types;

pub use client::HttpBackend;
pub use error::{ApiError, ApiErrorKind};
pub use types::MessagePageRequest;

use crate::conversation::{Conversation, Message};
use crate::status::ConversationStatus;
use async_trait::async_trait;
use std::sync::Arc;
use types::{ApiMessage, ApiPage};

/// One page of messages, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub page: u32,
    pub total_pages: u32,
    /// No older pages remain
    pub last: bool,
}

impl MessagePage {
    /// The endpoint sorts newest first; the conversation keeps oldest first
    fn from_newest_first(page: ApiPage<ApiMessage>) -> Self {
        let mut messages: Vec<Message> = page
            .content
            .into_iter()
            .map(ApiMessage::into_message)
            .collect();
        messages.reverse();
        Self {
            messages,
            page: page.page,
            total_pages: page.total_pages,
            last: page.last,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: String,
    pub conversation_id: String,
}

/// Operations the console needs from the backend
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, ApiError>;

    async fn change_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), ApiError>;

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        agent_ids: &[String],
    ) -> Result<(), ApiError>;

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: MessagePageRequest,
    ) -> Result<MessagePage, ApiError>;

    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<SentMessage, ApiError>;
}

#[async_trait]
impl<T: ConsoleBackend + ?Sized> ConsoleBackend for Arc<T> {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, ApiError> {
        (**self).get_conversation(conversation_id).await
    }

    async fn change_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), ApiError> {
        (**self).change_status(conversation_id, status).await
    }

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        agent_ids: &[String],
    ) -> Result<(), ApiError> {
        (**self).assign_conversation(conversation_id, agent_ids).await
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: MessagePageRequest,
    ) -> Result<MessagePage, ApiError> {
        (**self).list_messages(conversation_id, page).await
    }

    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<SentMessage, ApiError> {
        (**self).send_text(conversation_id, text).await
    }
}

/// Logging wrapper for backend calls
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: ConsoleBackend> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    fn log<T>(
        operation: &str,
        conversation_id: &str,
        started: std::time::Instant,
        result: &Result<T, ApiError>,
    ) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::debug!(
                    operation,
                    conversation_id = %conversation_id,
                    duration_ms = %duration.as_millis(),
                    "Backend request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    conversation_id = %conversation_id,
                    duration_ms = %duration.as_millis(),
                    status = ?e.status,
                    code = ?e.code,
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Backend request failed"
                );
            }
        }
    }
}

#[async_trait]
impl<B: ConsoleBackend> ConsoleBackend for LoggingBackend<B> {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, ApiError> {
        let started = std::time::Instant::now();
        let result = self.inner.get_conversation(conversation_id).await;
        Self::log("get_conversation", conversation_id, started, &result);
        result
    }

    async fn change_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), ApiError> {
        let started = std::time::Instant::now();
        let result = self.inner.change_status(conversation_id, status).await;
        Self::log("change_status", conversation_id, started, &result);
        if result.is_ok() {
            tracing::info!(
                conversation_id = %conversation_id,
                status = %status,
                "Conversation status changed"
            );
        }
        result
    }

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        agent_ids: &[String],
    ) -> Result<(), ApiError> {
        let started = std::time::Instant::now();
        let result = self.inner.assign_conversation(conversation_id, agent_ids).await;
        Self::log("assign_conversation", conversation_id, started, &result);
        result
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: MessagePageRequest,
    ) -> Result<MessagePage, ApiError> {
        let started = std::time::Instant::now();
        let result = self.inner.list_messages(conversation_id, page).await;
        Self::log("list_messages", conversation_id, started, &result);
        result
    }

    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<SentMessage, ApiError> {
        let started = std::time::Instant::now();
        let result = self.inner.send_text(conversation_id, text).await;
        Self::log("send_text", conversation_id, started, &result);
        result
    }
}
