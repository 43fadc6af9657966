//! Conversation status machine
//!
//! A static rule table maps every status to its display label, tone and the
//! ordered set of statuses an agent may move it to. All lookups are pure and
//! total over [`ConversationStatus`]; codes that do not parse into a known
//! status are carried as [`StatusCode::Unknown`] and fail closed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(test)]
mod proptests;

/// Lifecycle status of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    /// Bot is handling the conversation
    Active,
    /// A human agent took over
    Intervened,
    /// Customer stopped responding
    NoAnswer,
    /// Finished and archived
    Closed,
}

/// Presentational affinity of a status (badge/button color)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Success,
    Warning,
    Danger,
    Neutral,
}

/// Configuration for a single status
#[derive(Debug, PartialEq, Eq)]
pub struct StatusRule {
    pub label: &'static str,
    pub tone: StatusTone,
    /// Ordered by priority; the order drives the primary-action fallback
    pub transitions: &'static [ConversationStatus],
}

const ACTIVE_RULE: StatusRule = StatusRule {
    label: "Activa",
    tone: StatusTone::Success,
    transitions: &[
        ConversationStatus::Intervened,
        ConversationStatus::Closed,
        ConversationStatus::NoAnswer,
    ],
};

const INTERVENED_RULE: StatusRule = StatusRule {
    label: "Intervenida",
    tone: StatusTone::Warning,
    transitions: &[
        ConversationStatus::Active,
        ConversationStatus::Closed,
        ConversationStatus::NoAnswer,
    ],
};

const NO_ANSWER_RULE: StatusRule = StatusRule {
    label: "No Contesta",
    tone: StatusTone::Danger,
    transitions: &[
        ConversationStatus::Active,
        ConversationStatus::Closed,
        ConversationStatus::Intervened,
    ],
};

const CLOSED_RULE: StatusRule = StatusRule {
    label: "Cerrada",
    tone: StatusTone::Neutral,
    transitions: &[ConversationStatus::Active],
};

/// Caption of the primary button when no transition is available
pub const FALLBACK_ACTION_LABEL: &str = "Cambiar Estado";

impl ConversationStatus {
    pub const ALL: [ConversationStatus; 4] = [
        ConversationStatus::Active,
        ConversationStatus::Intervened,
        ConversationStatus::NoAnswer,
        ConversationStatus::Closed,
    ];

    /// Wire code used by the backend
    pub fn code(self) -> &'static str {
        match self {
            ConversationStatus::Active => "ACTIVE",
            ConversationStatus::Intervened => "INTERVENED",
            ConversationStatus::NoAnswer => "NO_ANSWER",
            ConversationStatus::Closed => "CLOSED",
        }
    }

    /// Parse a backend status code.
    ///
    /// Accepts the canonical codes in any case (the v1 API sends both
    /// `ACTIVE` and `active`) and the display names used by the legacy
    /// endpoints.
    pub fn from_code(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let by_code = Self::ALL
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(raw));
        by_code.or_else(|| match raw {
            "Activa" => Some(ConversationStatus::Active),
            "Intervenida" => Some(ConversationStatus::Intervened),
            "Sin respuesta" | "No Contesta" => Some(ConversationStatus::NoAnswer),
            "Cerrada" => Some(ConversationStatus::Closed),
            _ => None,
        })
    }

    pub fn rule(self) -> &'static StatusRule {
        match self {
            ConversationStatus::Active => &ACTIVE_RULE,
            ConversationStatus::Intervened => &INTERVENED_RULE,
            ConversationStatus::NoAnswer => &NO_ANSWER_RULE,
            ConversationStatus::Closed => &CLOSED_RULE,
        }
    }

    pub fn label(self) -> &'static str {
        self.rule().label
    }

    pub fn is_archived(self) -> bool {
        self == ConversationStatus::Closed
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown conversation status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for ConversationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Statuses reachable from `status`, in priority order
pub fn allowed_transitions(status: ConversationStatus) -> &'static [ConversationStatus] {
    status.rule().transitions
}

/// Statuses offered in the secondary dropdown next to the primary button
pub fn dropdown_transitions(status: ConversationStatus) -> &'static [ConversationStatus] {
    allowed_transitions(status)
}

/// Common-workflow shortcut for a status, if its target is currently allowed.
///
/// Bot to human, human to closed, and anything idle back to the bot.
fn preferred_action(status: ConversationStatus) -> Option<(ConversationStatus, &'static str)> {
    let (target, verb) = match status {
        ConversationStatus::Active => (ConversationStatus::Intervened, "Intervenir"),
        ConversationStatus::Intervened => (ConversationStatus::Closed, "Cerrar"),
        ConversationStatus::Closed | ConversationStatus::NoAnswer => {
            (ConversationStatus::Active, "Activar")
        }
    };
    allowed_transitions(status)
        .contains(&target)
        .then_some((target, verb))
}

/// Target of the one-click primary button
pub fn primary_action(status: ConversationStatus) -> ConversationStatus {
    match preferred_action(status) {
        Some((target, _)) => target,
        None => fallback_target(allowed_transitions(status)),
    }
}

/// Caption of the one-click primary button
pub fn primary_action_label(status: ConversationStatus) -> &'static str {
    match preferred_action(status) {
        Some((_, verb)) => verb,
        None => allowed_transitions(status)
            .first()
            .map_or(FALLBACK_ACTION_LABEL, |s| s.label()),
    }
}

fn fallback_target(allowed: &[ConversationStatus]) -> ConversationStatus {
    allowed.first().copied().unwrap_or(ConversationStatus::Closed)
}

/// Status as reported by the backend, which may not be one we know.
///
/// Unknown codes are kept verbatim so they can round-trip, but expose no
/// transitions and borrow the label of the ACTIVE rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCode {
    Known(ConversationStatus),
    Unknown(String),
}

impl StatusCode {
    pub fn known(&self) -> Option<ConversationStatus> {
        match self {
            StatusCode::Known(s) => Some(*s),
            StatusCode::Unknown(_) => None,
        }
    }

    pub fn rule(&self) -> &'static StatusRule {
        self.known().unwrap_or(ConversationStatus::Active).rule()
    }

    pub fn label(&self) -> &'static str {
        self.rule().label
    }

    pub fn allowed_transitions(&self) -> &'static [ConversationStatus] {
        match self.known() {
            Some(s) => allowed_transitions(s),
            None => &[],
        }
    }

    pub fn primary_action(&self) -> ConversationStatus {
        match self.known() {
            Some(s) => primary_action(s),
            None => fallback_target(&[]),
        }
    }

    pub fn primary_action_label(&self) -> &'static str {
        self.known()
            .map_or(FALLBACK_ACTION_LABEL, primary_action_label)
    }

    pub fn can_transition_to(&self, target: ConversationStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }
}

impl From<ConversationStatus> for StatusCode {
    fn from(status: ConversationStatus) -> Self {
        StatusCode::Known(status)
    }
}

impl From<&str> for StatusCode {
    fn from(raw: &str) -> Self {
        match ConversationStatus::from_code(raw) {
            Some(s) => StatusCode::Known(s),
            None => StatusCode::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for StatusCode {
    fn from(raw: String) -> Self {
        match ConversationStatus::from_code(&raw) {
            Some(s) => StatusCode::Known(s),
            None => StatusCode::Unknown(raw),
        }
    }
}

impl From<StatusCode> for String {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::Known(s) => s.code().to_string(),
            StatusCode::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Known(s) => fmt::Display::fmt(s, f),
            StatusCode::Unknown(raw) => f.write_str(raw),
        }
    }
}
