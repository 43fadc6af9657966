//! Paged message history
//!
//! The backend serves messages newest first, one page at a time. The latest
//! page alone can miss the customer's last inbound message when a long run
//! of agent or bot replies followed it, so loading keeps walking back until
//! a timestamped client message turns up or the history runs out.

use crate::api::{ApiError, ConsoleBackend, MessagePageRequest};
use crate::conversation::Message;
use crate::window::{last_client_contact, window_state, WindowState};
use chrono::{DateTime, Utc};

/// Messages loaded so far, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHistory {
    messages: Vec<Message>,
    next_page: u32,
    complete: bool,
}

impl MessageHistory {
    /// Load the latest page, plus as many older pages as needed to reach
    /// the customer's last inbound contact
    pub async fn load_latest<B: ConsoleBackend>(
        backend: &B,
        conversation_id: &str,
        page_size: u32,
    ) -> Result<Self, ApiError> {
        let mut history = Self::default();
        history.load_older(backend, conversation_id, page_size).await?;

        while !history.complete && last_client_contact(&history.messages).is_none() {
            tracing::debug!(
                conversation_id = %conversation_id,
                page = history.next_page,
                "No client contact on loaded pages, fetching older messages"
            );
            history.load_older(backend, conversation_id, page_size).await?;
        }

        Ok(history)
    }

    /// Fetch the next older page and prepend it. Returns how many messages
    /// were added.
    pub async fn load_older<B: ConsoleBackend>(
        &mut self,
        backend: &B,
        conversation_id: &str,
        page_size: u32,
    ) -> Result<usize, ApiError> {
        if self.complete {
            return Ok(0);
        }

        let request = MessagePageRequest {
            page: self.next_page,
            size: page_size,
        };
        let page = backend.list_messages(conversation_id, request).await?;

        self.next_page = self.next_page.saturating_add(1);
        self.complete = page.last || page.messages.is_empty();

        // New messages shift page boundaries between fetches
        let mut older: Vec<Message> = page
            .messages
            .into_iter()
            .filter(|m| !self.messages.iter().any(|known| known.id == m.id))
            .collect();
        let added = older.len();
        older.append(&mut self.messages);
        self.messages = older;

        Ok(added)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// No older pages remain on the backend
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn pages_loaded(&self) -> u32 {
        self.next_page
    }

    /// Window state over the loaded messages.
    ///
    /// Without client contact in a partial history the answer is unknown,
    /// which is reported as expired so free text stays locked.
    pub fn window_state(&self, now: DateTime<Utc>) -> WindowState {
        match window_state(&self.messages, now) {
            WindowState::NoClientContact if !self.complete => WindowState::Expired { since: now },
            state => state,
        }
    }
}
