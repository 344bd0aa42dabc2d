use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::{Session, SessionType};

/// Every lifecycle transition produces an event carrying the session as it
/// looked right after the transition. The UI layer subscribes to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Started {
        session: Session,
        /// Set when the session was launched by the auto-start policy.
        auto: bool,
    },
    Paused {
        session: Session,
        remaining_secs: u64,
    },
    Resumed {
        session: Session,
        remaining_secs: u64,
    },
    Completed {
        session: Session,
        next_suggested: SessionType,
    },
    Interrupted {
        session: Session,
    },
    /// A pending break suggestion was dropped without creating a session.
    BreakSkipped {
        skipped: SessionType,
        next_suggested: SessionType,
        at: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    pub fn session(&self) -> Option<&Session> {
        match self {
            LifecycleEvent::Started { session, .. }
            | LifecycleEvent::Paused { session, .. }
            | LifecycleEvent::Resumed { session, .. }
            | LifecycleEvent::Completed { session, .. }
            | LifecycleEvent::Interrupted { session } => Some(session),
            LifecycleEvent::BreakSkipped { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Started { .. } => "started",
            LifecycleEvent::Paused { .. } => "paused",
            LifecycleEvent::Resumed { .. } => "resumed",
            LifecycleEvent::Completed { .. } => "completed",
            LifecycleEvent::Interrupted { .. } => "interrupted",
            LifecycleEvent::BreakSkipped { .. } => "break_skipped",
        }
    }
}

const DEFAULT_CAPACITY: usize = 64;

/// Broadcast channel for lifecycle events. Publishing with no subscribers
/// is not an error; slow subscribers observe `Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: LifecycleEvent) {
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
