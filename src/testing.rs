//! Mock backend for testing
//!
//! Records every call and answers from queued results, so workflows can be
//! exercised without HTTP.

use crate::api::{ApiError, ConsoleBackend, MessagePage, MessagePageRequest, SentMessage};
use crate::conversation::Conversation;
use crate::status::ConversationStatus;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    GetConversation(String),
    ChangeStatus(String, ConversationStatus),
    Assign(String, Vec<String>),
    ListMessages(String, MessagePageRequest),
    SendText(String, String),
}

pub struct MockBackend {
    pub calls: Mutex<Vec<BackendCall>>,
    conversations: Mutex<VecDeque<Result<Conversation, ApiError>>>,
    status_results: Mutex<VecDeque<Result<(), ApiError>>>,
    assign_results: Mutex<VecDeque<Result<(), ApiError>>>,
    pages: Mutex<VecDeque<Result<MessagePage, ApiError>>>,
    list_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            conversations: Mutex::new(VecDeque::new()),
            status_results: Mutex::new(VecDeque::new()),
            assign_results: Mutex::new(VecDeque::new()),
            pages: Mutex::new(VecDeque::new()),
            list_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make `list_messages` take `delay` (use with paused tokio time)
    #[must_use]
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn queue_conversation(&self, result: Result<Conversation, ApiError>) {
        self.conversations.lock().unwrap().push_back(result);
    }

    pub fn queue_status_result(&self, result: Result<(), ApiError>) {
        self.status_results.lock().unwrap().push_back(result);
    }

    pub fn queue_assign_result(&self, result: Result<(), ApiError>) {
        self.assign_results.lock().unwrap().push_back(result);
    }

    pub fn queue_page(&self, result: Result<MessagePage, ApiError>) {
        self.pages.lock().unwrap().push_back(result);
    }

    pub fn recorded_calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of concurrent `list_messages` calls observed
    pub fn max_concurrent_lists(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsoleBackend for MockBackend {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, ApiError> {
        self.record(BackendCall::GetConversation(conversation_id.to_string()));
        self.conversations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::from_response(404, None, "Conversation not found")))
    }

    async fn change_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), ApiError> {
        self.record(BackendCall::ChangeStatus(conversation_id.to_string(), status));
        self.status_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        agent_ids: &[String],
    ) -> Result<(), ApiError> {
        self.record(BackendCall::Assign(
            conversation_id.to_string(),
            agent_ids.to_vec(),
        ));
        self.assign_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: MessagePageRequest,
    ) -> Result<MessagePage, ApiError> {
        self.record(BackendCall::ListMessages(conversation_id.to_string(), page));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(MessagePage::default()))
    }

    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<SentMessage, ApiError> {
        self.record(BackendCall::SendText(
            conversation_id.to_string(),
            text.to_string(),
        ));
        Ok(SentMessage {
            id: format!("sent-{}", self.calls.lock().unwrap().len()),
            conversation_id: conversation_id.to_string(),
        })
    }
}
