//! Inbox console core
//!
//! Conversation lifecycle rules and the 24-hour messaging-window gate for a
//! multi-channel support inbox, plus the headless plumbing that drives them
//! against the REST backend.

pub mod actions;
pub mod api;
pub mod composer;
pub mod config;
pub mod conversation;
pub mod history;
pub mod poller;
pub mod status;
pub mod window;

#[cfg(test)]
pub mod testing;

pub use conversation::{apply_transition, Conversation, Message, SenderRole, TransitionPolicy};
pub use history::MessageHistory;
pub use status::{
    allowed_transitions, dropdown_transitions, primary_action, primary_action_label,
    ConversationStatus, StatusCode,
};
pub use window::{is_outside_window, window_state, WindowState};
