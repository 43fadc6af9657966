//! Conversation model and its status-driven mutation

mod message;

pub use message::{Attachment, DeliveryStatus, Message, MessageKind, SenderRole};

use crate::status::{ConversationStatus, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub customer: Customer,
    pub status: StatusCode,
    pub archived: bool,
    /// Agents the conversation is assigned to. Independent of status.
    #[serde(default)]
    pub assigned_agents: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    /// Oldest first. Append-only.
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// How [`Conversation::transition_to`] treats targets the rule table does
/// not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Apply anything and let the backend reject illegal moves
    #[default]
    Permissive,
    /// Refuse targets outside `allowed_transitions`
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot move conversation from {from} to {to}")]
    NotAllowed {
        from: StatusCode,
        to: ConversationStatus,
    },
}

/// Record of an applied status change, enough to undo it exactly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub previous_status: StatusCode,
    pub previous_archived: bool,
    pub new_status: ConversationStatus,
}

impl Conversation {
    pub fn new(id: impl Into<String>, customer: Customer, status: impl Into<StatusCode>) -> Self {
        let status = status.into();
        let archived = status.known().is_some_and(ConversationStatus::is_archived);
        Self {
            id: id.into(),
            customer,
            status,
            archived,
            assigned_agents: Vec::new(),
            created_at: None,
            last_activity: None,
            messages: Vec::new(),
        }
    }

    /// Change status under `policy`. CLOSED archives, anything else
    /// unarchives.
    pub fn transition_to(
        &mut self,
        new_status: ConversationStatus,
        policy: TransitionPolicy,
    ) -> Result<StatusChange, TransitionError> {
        if policy == TransitionPolicy::Strict && !self.status.can_transition_to(new_status) {
            return Err(TransitionError::NotAllowed {
                from: self.status.clone(),
                to: new_status,
            });
        }

        Ok(self.apply(new_status))
    }

    /// Unconditionally move to `new_status`. CLOSED archives, anything else
    /// unarchives.
    pub(crate) fn apply(&mut self, new_status: ConversationStatus) -> StatusChange {
        let change = StatusChange {
            previous_status: std::mem::replace(&mut self.status, new_status.into()),
            previous_archived: self.archived,
            new_status,
        };
        self.archived = new_status.is_archived();
        change
    }

    /// Undo a change made by [`Conversation::transition_to`]
    pub fn rollback(&mut self, change: &StatusChange) {
        self.status = change.previous_status.clone();
        self.archived = change.previous_archived;
    }

    /// Record an agent assignment. Does not touch status.
    pub fn assign_agent(&mut self, agent_id: impl Into<String>) {
        let agent_id = agent_id.into();
        if !self.assigned_agents.contains(&agent_id) {
            self.assigned_agents.push(agent_id);
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_agents.is_empty()
    }

    pub fn push_message(&mut self, message: Message) {
        if let Some(ts) = message.timestamp {
            if self.last_activity.map_or(true, |last| ts > last) {
                self.last_activity = Some(ts);
            }
        }
        self.messages.push(message);
    }

    /// Replace the message history with a freshly fetched one
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = Vec::with_capacity(messages.len());
        for message in messages {
            self.push_message(message);
        }
    }
}

/// Optimistically move `conversation` to `new_status`.
///
/// Never rejects; illegal moves are left for the backend to refuse.
pub fn apply_transition(
    mut conversation: Conversation,
    new_status: ConversationStatus,
) -> Conversation {
    conversation.apply(new_status);
    conversation
}
