//! 24-hour messaging window
//!
//! Messaging providers only accept free-form replies within a fixed window
//! after the customer's last inbound message. Past that, only pre-approved
//! templates may be sent. Everything here is a pure function of the
//! message history and a clock reading, so callers must re-evaluate on
//! every render or poll instead of caching the result.

use crate::conversation::Message;
use chrono::{DateTime, Duration, Utc};

pub const WINDOW_HOURS: i64 = 24;

pub fn window_length() -> Duration {
    Duration::hours(WINDOW_HOURS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// No timestamped client message yet; replies are allowed
    NoClientContact,
    /// Free-form replies allowed for `remaining` more
    Open { remaining: Duration },
    /// Window closed at `since`; only templates may be sent
    Expired { since: DateTime<Utc> },
}

impl WindowState {
    pub fn is_outside(&self) -> bool {
        matches!(self, WindowState::Expired { .. })
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self {
            WindowState::Open { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

/// Timestamp of the latest client message in sequence order.
///
/// Messages without a usable timestamp are skipped.
pub fn last_client_contact(messages: &[Message]) -> Option<DateTime<Utc>> {
    messages
        .iter()
        .rev()
        .filter(|m| m.is_from_client())
        .find_map(|m| m.timestamp)
}

pub fn window_state(messages: &[Message], now: DateTime<Utc>) -> WindowState {
    let Some(contact) = last_client_contact(messages) else {
        return WindowState::NoClientContact;
    };

    // Clock skew can put the client's message in our future
    let elapsed = (now - contact).max(Duration::zero());
    if elapsed >= window_length() {
        WindowState::Expired {
            since: contact + window_length(),
        }
    } else {
        WindowState::Open {
            remaining: window_length() - elapsed,
        }
    }
}

/// Whether free-form replies are locked. The 24h mark itself is outside.
pub fn is_outside_window(messages: &[Message], now: DateTime<Utc>) -> bool {
    window_state(messages, now).is_outside()
}

/// Countdown text shown next to the composer: `5h 12m`, or `42m` under an hour
pub fn format_remaining(remaining: Duration) -> String {
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
