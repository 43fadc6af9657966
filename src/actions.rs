//! Agent-triggered conversation actions
//!
//! Status changes are applied optimistically and rolled back if the backend
//! refuses them. Intervening is pessimistic: the local copy only changes
//! once both the assignment and the status change succeeded.

use crate::api::{ApiError, ApiErrorKind, ConsoleBackend, SentMessage};
use crate::composer::{decide_send, SendDecision};
use crate::conversation::{Conversation, TransitionError, TransitionPolicy};
use crate::status::ConversationStatus;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-facing notification (toast plus optional inline alert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
    /// Offer a retry button
    pub retryable: bool,
}

impl Notice {
    fn success(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.map(String::from),
            retryable: false,
        }
    }

    fn failure(title: impl Into<String>, error: &ApiError, connectivity_hint: bool) -> Self {
        let description = if connectivity_hint {
            let text = if error.kind == ApiErrorKind::Network {
                "No se pudo conectar con el servidor. Verifica tu conexión e intenta nuevamente."
            } else {
                "Error al comunicarse con el servicio. El servicio podría no estar disponible."
            };
            Some(text.to_string())
        } else {
            Some(error.message.clone())
        };
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description,
            retryable: error.kind.is_retryable(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Usuario no autenticado")]
    NotAuthenticated,
    #[error("{}", .notice.title)]
    Backend {
        #[source]
        source: ApiError,
        notice: Notice,
    },
}

impl ActionError {
    /// Notice to surface for this failure
    pub fn notice(&self) -> Notice {
        match self {
            ActionError::Backend { notice, .. } => notice.clone(),
            other => Notice {
                level: NoticeLevel::Error,
                title: other.to_string(),
                description: None,
                retryable: false,
            },
        }
    }
}

/// Result of a send attempt from the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(SentMessage),
    /// Window expired; the caller must open the template picker
    TemplateRequired,
    /// Empty draft, nothing sent
    Skipped,
}

pub struct ConversationActions<B> {
    backend: B,
    policy: TransitionPolicy,
}

impl<B: ConsoleBackend> ConversationActions<B> {
    pub fn new(backend: B, policy: TransitionPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Move `conversation` to `target`, reverting the local copy if the
    /// backend rejects the change
    pub async fn change_status(
        &self,
        conversation: &mut Conversation,
        target: ConversationStatus,
    ) -> Result<Notice, ActionError> {
        let change = conversation.transition_to(target, self.policy)?;

        if let Err(e) = self.backend.change_status(&conversation.id, target).await {
            conversation.rollback(&change);
            tracing::warn!(
                conversation_id = %conversation.id,
                target = %target,
                restored = %conversation.status,
                error = %e,
                "Status change rejected, local state restored"
            );
            let notice = Notice::failure(
                "Error al cambiar el estado de la conversación",
                &e,
                false,
            );
            return Err(ActionError::Backend { source: e, notice });
        }

        Ok(Notice::success(
            format!("Estado cambiado a \"{}\" exitosamente", target.label()),
            None,
        ))
    }

    /// Run the primary action for the conversation's current status
    pub async fn primary_action(
        &self,
        conversation: &mut Conversation,
    ) -> Result<Notice, ActionError> {
        let target = conversation.status.primary_action();
        self.change_status(conversation, target).await
    }

    /// Assign `agent_id` and hand the conversation over to them
    pub async fn intervene(
        &self,
        conversation: &mut Conversation,
        agent_id: &str,
    ) -> Result<Notice, ActionError> {
        if agent_id.trim().is_empty() {
            return Err(ActionError::NotAuthenticated);
        }
        if self.policy == TransitionPolicy::Strict
            && !conversation.status.can_transition_to(ConversationStatus::Intervened)
        {
            return Err(TransitionError::NotAllowed {
                from: conversation.status.clone(),
                to: ConversationStatus::Intervened,
            }
            .into());
        }

        let assigned = self
            .backend
            .assign_conversation(&conversation.id, &[agent_id.to_string()])
            .await;
        let result = match assigned {
            Ok(()) => {
                self.backend
                    .change_status(&conversation.id, ConversationStatus::Intervened)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            let notice = Notice::failure("Error al intervenir la conversación", &e, true);
            return Err(ActionError::Backend { source: e, notice });
        }

        conversation.assign_agent(agent_id);
        conversation.apply(ConversationStatus::Intervened);
        tracing::info!(
            conversation_id = %conversation.id,
            agent_id = %agent_id,
            "Conversation intervened"
        );

        Ok(Notice::success(
            "Conversación intervenida exitosamente",
            Some("Ahora puedes responder como agente en esta conversación"),
        ))
    }

    /// Send a composer draft, honoring the messaging window.
    ///
    /// `conversation.messages` must come from [`MessageHistory::load_latest`]
    /// so the last client contact is present.
    ///
    /// [`MessageHistory::load_latest`]: crate::history::MessageHistory::load_latest
    pub async fn send_draft(
        &self,
        conversation: &Conversation,
        draft: &str,
        now: DateTime<Utc>,
    ) -> Result<SendOutcome, ActionError> {
        match decide_send(&conversation.messages, now, draft, 0) {
            SendDecision::Nothing => Ok(SendOutcome::Skipped),
            SendDecision::RequireTemplate => {
                tracing::debug!(
                    conversation_id = %conversation.id,
                    "Messaging window expired, template required"
                );
                Ok(SendOutcome::TemplateRequired)
            }
            SendDecision::SendText { text } => {
                match self.backend.send_text(&conversation.id, &text).await {
                    Ok(sent) => Ok(SendOutcome::Sent(sent)),
                    Err(e) => {
                        let notice = Notice::failure("Error al enviar el mensaje", &e, false);
                        Err(ActionError::Backend { source: e, notice })
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Customer, Message, SenderRole};
    use crate::status::StatusCode;
    use crate::testing::{BackendCall, MockBackend};
    use chrono::Duration;

    fn conversation(status: ConversationStatus) -> Conversation {
        Conversation::new("c-1", Customer::default(), status)
    }

    fn actions(policy: TransitionPolicy) -> ConversationActions<MockBackend> {
        ConversationActions::new(MockBackend::new(), policy)
    }

    #[tokio::test]
    async fn change_status_applies_and_notifies() {
        let actions = actions(TransitionPolicy::Permissive);
        let mut conv = conversation(ConversationStatus::Intervened);

        let notice = actions
            .change_status(&mut conv, ConversationStatus::Closed)
            .await
            .unwrap();

        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.title, "Estado cambiado a \"Cerrada\" exitosamente");
        assert!(conv.archived);
        assert_eq!(
            actions.backend().recorded_calls(),
            vec![BackendCall::ChangeStatus("c-1".to_string(), ConversationStatus::Closed)]
        );
    }

    #[tokio::test]
    async fn rejected_change_is_rolled_back() {
        let actions = actions(TransitionPolicy::Permissive);
        actions
            .backend()
            .queue_status_result(Err(ApiError::network("connection reset")));
        let mut conv = conversation(ConversationStatus::Closed);

        let err = actions
            .change_status(&mut conv, ConversationStatus::Active)
            .await
            .unwrap_err();

        assert_eq!(conv.status, StatusCode::Known(ConversationStatus::Closed));
        assert!(conv.archived);
        let notice = err.notice();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.retryable);
    }

    #[tokio::test]
    async fn strict_policy_never_reaches_backend() {
        let actions = actions(TransitionPolicy::Strict);
        let mut conv = conversation(ConversationStatus::Closed);

        let err = actions
            .change_status(&mut conv, ConversationStatus::NoAnswer)
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::Transition(_)));
        assert!(actions.backend().recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn primary_action_uses_status_table() {
        let actions = actions(TransitionPolicy::Strict);
        let mut conv = conversation(ConversationStatus::NoAnswer);
        actions.primary_action(&mut conv).await.unwrap();
        assert_eq!(conv.status, StatusCode::Known(ConversationStatus::Active));
    }

    #[tokio::test]
    async fn intervene_assigns_then_changes_status() {
        let actions = actions(TransitionPolicy::Strict);
        let mut conv = conversation(ConversationStatus::Active);

        let notice = actions.intervene(&mut conv, "agent-7").await.unwrap();

        assert_eq!(notice.title, "Conversación intervenida exitosamente");
        assert_eq!(conv.status, StatusCode::Known(ConversationStatus::Intervened));
        assert!(!conv.archived);
        assert_eq!(conv.assigned_agents, vec!["agent-7".to_string()]);
        assert_eq!(
            actions.backend().recorded_calls(),
            vec![
                BackendCall::Assign("c-1".to_string(), vec!["agent-7".to_string()]),
                BackendCall::ChangeStatus("c-1".to_string(), ConversationStatus::Intervened),
            ]
        );
    }

    #[tokio::test]
    async fn failed_assignment_leaves_conversation_untouched() {
        let actions = actions(TransitionPolicy::Permissive);
        actions
            .backend()
            .queue_assign_result(Err(ApiError::network("timeout")));
        let mut conv = conversation(ConversationStatus::Active);

        let err = actions.intervene(&mut conv, "agent-7").await.unwrap_err();

        assert_eq!(conv.status, StatusCode::Known(ConversationStatus::Active));
        assert!(conv.is_unassigned());
        assert_eq!(actions.backend().recorded_calls().len(), 1);
        let notice = err.notice();
        assert_eq!(notice.title, "Error al intervenir la conversación");
        assert_eq!(
            notice.description.as_deref(),
            Some("No se pudo conectar con el servidor. Verifica tu conexión e intenta nuevamente.")
        );
    }

    #[tokio::test]
    async fn failed_status_change_after_assignment_leaves_local_copy() {
        let actions = actions(TransitionPolicy::Permissive);
        actions.backend().queue_assign_result(Ok(()));
        actions.backend().queue_status_result(Err(ApiError::from_response(
            500,
            Some("application/json"),
            r#"{"message":"Internal error","errorCode":"CONV_500"}"#,
        )));
        let mut conv = conversation(ConversationStatus::NoAnswer);

        let err = actions.intervene(&mut conv, "agent-7").await.unwrap_err();

        assert_eq!(conv.status, StatusCode::Known(ConversationStatus::NoAnswer));
        assert!(!conv.archived);
        assert!(conv.is_unassigned());
        assert_eq!(
            actions.backend().recorded_calls(),
            vec![
                BackendCall::Assign("c-1".to_string(), vec!["agent-7".to_string()]),
                BackendCall::ChangeStatus("c-1".to_string(), ConversationStatus::Intervened),
            ]
        );
        let notice = err.notice();
        assert_eq!(notice.title, "Error al intervenir la conversación");
        assert_eq!(
            notice.description.as_deref(),
            Some("Error al comunicarse con el servicio. El servicio podría no estar disponible.")
        );
        assert!(notice.retryable);
    }

    #[tokio::test]
    async fn intervene_requires_agent() {
        let actions = actions(TransitionPolicy::Permissive);
        let mut conv = conversation(ConversationStatus::Active);
        let err = actions.intervene(&mut conv, " ").await.unwrap_err();
        assert!(matches!(err, ActionError::NotAuthenticated));
        assert_eq!(err.notice().title, "Usuario no autenticado");
    }

    #[tokio::test]
    async fn send_draft_respects_window() {
        let actions = actions(TransitionPolicy::Permissive);
        let now = Utc::now();
        let mut conv = conversation(ConversationStatus::Intervened);
        conv.push_message(Message::text(
            "m-1",
            SenderRole::Client,
            Some(now - Duration::hours(30)),
            "hola",
        ));

        let outcome = actions.send_draft(&conv, "seguimos?", now).await.unwrap();
        assert_eq!(outcome, SendOutcome::TemplateRequired);
        assert!(actions.backend().recorded_calls().is_empty());

        conv.push_message(Message::text(
            "m-2",
            SenderRole::Client,
            Some(now - Duration::minutes(3)),
            "sigo aca",
        ));
        let outcome = actions.send_draft(&conv, " perfecto ", now).await.unwrap();
        assert!(matches!(outcome, SendOutcome::Sent(_)));
        assert_eq!(
            actions.backend().recorded_calls(),
            vec![BackendCall::SendText("c-1".to_string(), "perfecto".to_string())]
        );
    }
}
