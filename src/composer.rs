//! Message composer gate
//!
//! Routes the send action either to a plain text send or to the template
//! picker, depending on the messaging window.

use crate::conversation::Message;
use crate::window::{format_remaining, window_state, WindowState};
use chrono::{DateTime, Utc};

/// What pressing "send" should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendDecision {
    /// Send the trimmed text (attachments, if any, go along with it)
    SendText { text: String },
    /// Window expired: open the template picker instead of sending
    RequireTemplate,
    /// Nothing to send
    Nothing,
}

pub fn decide_send(
    messages: &[Message],
    now: DateTime<Utc>,
    draft: &str,
    attachment_count: usize,
) -> SendDecision {
    let text = draft.trim();
    if !text.is_empty() && window_state(messages, now).is_outside() {
        return SendDecision::RequireTemplate;
    }
    if text.is_empty() && attachment_count == 0 {
        return SendDecision::Nothing;
    }
    SendDecision::SendText {
        text: text.to_string(),
    }
}

/// Render-time view of the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerState {
    pub free_text_enabled: bool,
    pub show_window_banner: bool,
    /// Countdown until the window closes, when it is open
    pub remaining_label: Option<String>,
}

impl ComposerState {
    pub fn evaluate(messages: &[Message], now: DateTime<Utc>) -> Self {
        let state = window_state(messages, now);
        Self {
            free_text_enabled: !state.is_outside(),
            show_window_banner: state.is_outside(),
            remaining_label: match state {
                WindowState::Open { remaining } => Some(format_remaining(remaining)),
                WindowState::NoClientContact | WindowState::Expired { .. } => None,
            },
        }
    }

    pub fn placeholder(&self) -> &'static str {
        if self.free_text_enabled {
            "Escribe un mensaje..."
        } else {
            "Ventana de 24h expirada. Usa el botón de plantillas"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::SenderRole;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn client_msg(ago: Duration) -> Message {
        Message::text("c", SenderRole::Client, Some(now() - ago), "hola")
    }

    #[test]
    fn sends_trimmed_text_inside_window() {
        let messages = [client_msg(Duration::hours(1))];
        assert_eq!(
            decide_send(&messages, now(), "  gracias  ", 0),
            SendDecision::SendText {
                text: "gracias".to_string()
            }
        );
    }

    #[test]
    fn text_outside_window_requires_template() {
        let messages = [client_msg(Duration::hours(25))];
        assert_eq!(
            decide_send(&messages, now(), "hola", 0),
            SendDecision::RequireTemplate
        );
    }

    #[test]
    fn attachments_only_are_not_redirected() {
        let messages = [client_msg(Duration::hours(25))];
        assert_eq!(
            decide_send(&messages, now(), "   ", 2),
            SendDecision::SendText {
                text: String::new()
            }
        );
    }

    #[test]
    fn blank_draft_sends_nothing() {
        assert_eq!(decide_send(&[], now(), "\n ", 0), SendDecision::Nothing);
    }

    #[test]
    fn composer_state_outside_window() {
        let state = ComposerState::evaluate(&[client_msg(Duration::hours(30))], now());
        assert!(!state.free_text_enabled);
        assert!(state.show_window_banner);
        assert_eq!(state.remaining_label, None);
        assert_eq!(
            state.placeholder(),
            "Ventana de 24h expirada. Usa el botón de plantillas"
        );
    }

    #[test]
    fn composer_state_shows_countdown() {
        let state = ComposerState::evaluate(&[client_msg(Duration::hours(20))], now());
        assert!(state.free_text_enabled);
        assert!(!state.show_window_banner);
        assert_eq!(state.remaining_label.as_deref(), Some("4h 0m"));
        assert_eq!(state.placeholder(), "Escribe un mensaje...");
    }
}
