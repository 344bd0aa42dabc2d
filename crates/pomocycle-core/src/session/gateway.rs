//! Hooks into collaborators the core does not own.
//!
//! Both gateways are fire-and-forget from the lifecycle manager's point of
//! view: an `Err` is logged and the session transition stands.

use serde::{Deserialize, Serialize};

use super::model::{Session, SessionType};
use crate::error::GatewayError;

/// Receives credit for completed work sessions.
pub trait TaskProgressGateway: Send + Sync {
    fn on_work_session_completed(&self, task_id: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WorkDone,
    BreakDone,
}

/// What the core asks a notifier to show. Delivery is the notifier's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub session_id: String,
    pub session_type: SessionType,
    pub task_id: Option<String>,
    pub next_suggested: SessionType,
    pub completed_work_count: u32,
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    pub fn for_completion(
        session: &Session,
        next_suggested: SessionType,
        completed_work_count: u32,
    ) -> (NotificationKind, Self) {
        let kind = if session.session_type.is_break() {
            NotificationKind::BreakDone
        } else {
            NotificationKind::WorkDone
        };
        let (title, body) = match kind {
            NotificationKind::WorkDone => (
                "Pomodoro complete".to_string(),
                match next_suggested {
                    SessionType::LongBreak => "Great work! Time for a long break.".to_string(),
                    _ => "Nice focus. Take a short break.".to_string(),
                },
            ),
            NotificationKind::BreakDone => (
                "Break over".to_string(),
                "Ready for the next focus session?".to_string(),
            ),
        };
        (
            kind,
            Self {
                session_id: session.id.clone(),
                session_type: session.session_type,
                task_id: session.task_id.clone(),
                next_suggested,
                completed_work_count,
                title,
                body,
            },
        )
    }
}

pub trait NotificationGateway: Send + Sync {
    fn notify(
        &self,
        kind: NotificationKind,
        payload: &NotificationPayload,
    ) -> Result<(), GatewayError>;
}

/// Gateway that accepts everything and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGateway;

impl TaskProgressGateway for NoopGateway {
    fn on_work_session_completed(&self, _task_id: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

impl NotificationGateway for NoopGateway {
    fn notify(
        &self,
        _kind: NotificationKind,
        _payload: &NotificationPayload,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Notifier that writes through `tracing`; hosts without a desktop
/// notification channel use it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationGateway for LogNotifier {
    fn notify(
        &self,
        kind: NotificationKind,
        payload: &NotificationPayload,
    ) -> Result<(), GatewayError> {
        tracing::info!(
            ?kind,
            session_id = %payload.session_id,
            next = payload.next_suggested.as_str(),
            "{}: {}",
            payload.title,
            payload.body
        );
        Ok(())
    }
}
