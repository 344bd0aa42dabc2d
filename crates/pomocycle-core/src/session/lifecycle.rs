//! Session lifecycle manager.
//!
//! Owns the single session slot and is the only writer of session status.
//!
//! ```text
//! Idle --start--> Active <--pause/resume--> Paused
//!                   |                          |
//!                   +--- expiry (tick) --> Completed --> Idle
//!                   +--- reset ----------> Interrupted -> Idle
//! ```
//!
//! Time only advances through [`SessionManager::tick`], which the host's
//! clock source calls once per second. Terminal sessions are appended to
//! the [`SessionStore`]; store and gateway failures are logged and never
//! undo a transition that has already happened in memory.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::gateway::{
    NoopGateway, NotificationGateway, NotificationPayload, TaskProgressGateway,
};
use super::model::{Session, SessionStatus, SessionType};
use crate::error::LifecycleError;
use crate::events::{EventBus, LifecycleEvent};
use crate::storage::SessionStore;
use crate::timer::{
    suggestion_after, Clock, CycleState, SystemClock, TimerEngine, TimerEvent, TimerState,
};

/// Plain options supplied at construction. Durations are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerOptions {
    pub work_duration: u64,
    pub short_break_duration: u64,
    pub long_break_duration: u64,
    pub long_break_interval: u32,
    pub auto_start_breaks: bool,
    pub auto_start_work: bool,
    /// Ticks between a natural completion and the auto-started follow-up.
    pub auto_start_settle_secs: u64,
    /// Cap on consecutive auto-starts without an explicit start; `None` is unbounded.
    pub max_auto_cycles: Option<u32>,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            work_duration: 25 * 60,
            short_break_duration: 5 * 60,
            long_break_duration: 15 * 60,
            long_break_interval: 4,
            auto_start_breaks: false,
            auto_start_work: false,
            auto_start_settle_secs: 1,
            max_auto_cycles: None,
        }
    }
}

impl TimerOptions {
    /// Planned length of a session of this type. Never zero: a zero
    /// setting runs as a one-second session.
    pub fn duration_for(&self, session_type: SessionType) -> u64 {
        let secs = match session_type {
            SessionType::Work => self.work_duration,
            SessionType::ShortBreak => self.short_break_duration,
            SessionType::LongBreak => self.long_break_duration,
        };
        secs.max(1)
    }

    fn auto_start_enabled(&self, session_type: SessionType) -> bool {
        if session_type.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_work
        }
    }
}

/// An auto-start waiting for its settle delay to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAutoStart {
    pub session_type: SessionType,
    pub ticks_remaining: u64,
}

/// Everything a host needs to carry the manager across process restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerState {
    pub current: Option<Session>,
    pub timer: TimerEngine,
    pub cycle: CycleState,
    pub suggested_next: SessionType,
    #[serde(default)]
    pub last_work_task: Option<String>,
    #[serde(default)]
    pub pending_auto_start: Option<PendingAutoStart>,
    #[serde(default)]
    pub consecutive_auto_starts: u32,
}

impl ManagerState {
    fn fresh(options: &TimerOptions) -> Self {
        Self {
            current: None,
            timer: TimerEngine::new(),
            cycle: CycleState::new(options.long_break_interval),
            suggested_next: SessionType::Work,
            last_work_task: None,
            pending_auto_start: None,
            consecutive_auto_starts: 0,
        }
    }
}

/// Read-only summary for display.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub current: Option<Session>,
    pub timer_state: TimerState,
    pub remaining_secs: u64,
    pub progress_pct: f64,
    pub suggested_next: SessionType,
    pub cycle: CycleState,
    pub sessions_until_long_break: u32,
    pub pending_auto_start: Option<PendingAutoStart>,
}

pub type SharedSessionManager = Arc<Mutex<SessionManager>>;

pub struct SessionManager {
    options: TimerOptions,
    state: ManagerState,
    store: Arc<dyn SessionStore>,
    tasks: Arc<dyn TaskProgressGateway>,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl SessionManager {
    pub fn new(options: TimerOptions, store: Arc<dyn SessionStore>) -> Self {
        let state = ManagerState::fresh(&options);
        Self {
            options,
            state,
            store,
            tasks: Arc::new(NoopGateway),
            notifier: Arc::new(NoopGateway),
            clock: Arc::new(SystemClock),
            events: EventBus::default(),
        }
    }

    /// Rebuild a manager from a saved [`ManagerState`].
    ///
    /// The long-break interval always comes from `options`, so config edits
    /// apply to a restored cycle. A slot whose timer is not counting down
    /// (or the reverse) cannot be resumed and is dropped.
    pub fn restore(
        options: TimerOptions,
        store: Arc<dyn SessionStore>,
        mut state: ManagerState,
    ) -> Self {
        state.cycle.long_break_interval = options.long_break_interval;
        let slot_matches_timer = match (&state.current, state.timer.state()) {
            (None, TimerState::Running | TimerState::Paused) => false,
            (None, _) => true,
            (Some(s), TimerState::Running) => s.status == SessionStatus::Active,
            (Some(s), TimerState::Paused) => s.status == SessionStatus::Paused,
            (Some(_), _) => false,
        };
        if !slot_matches_timer {
            tracing::warn!(
                timer = ?state.timer.state(),
                session = state.current.as_ref().map(|s| s.id.as_str()),
                "discarding inconsistent session slot"
            );
            state.current = None;
            state.timer.reset();
        }
        let mut manager = Self::new(options, store);
        manager.state = state;
        manager
    }

    pub fn with_task_gateway(mut self, tasks: Arc<dyn TaskProgressGateway>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationGateway>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn into_shared(self) -> SharedSessionManager {
        Arc::new(Mutex::new(self))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn options(&self) -> &TimerOptions {
        &self.options
    }

    pub fn current(&self) -> Option<&Session> {
        self.state.current.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.state.current.is_none()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.timer.remaining_secs()
    }

    pub fn timer_state(&self) -> TimerState {
        self.state.timer.state()
    }

    pub fn cycle(&self) -> CycleState {
        self.state.cycle
    }

    pub fn suggested_next(&self) -> SessionType {
        self.state.suggested_next
    }

    pub fn pending_auto_start(&self) -> Option<PendingAutoStart> {
        self.state.pending_auto_start
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> ManagerState {
        self.state.clone()
    }

    pub fn status(&self) -> StatusSnapshot {
        let remaining = self.remaining_secs();
        StatusSnapshot {
            current: self.state.current.clone(),
            timer_state: self.timer_state(),
            remaining_secs: remaining,
            progress_pct: self
                .state
                .current
                .as_ref()
                .map(|s| s.progress_pct(remaining))
                .unwrap_or(0.0),
            suggested_next: self.state.suggested_next,
            cycle: self.state.cycle,
            sessions_until_long_break: self.state.cycle.sessions_until_long_break(),
            pending_auto_start: self.state.pending_auto_start,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session in the empty slot. `task_id` is ignored for breaks.
    pub fn start(
        &mut self,
        session_type: SessionType,
        task_id: Option<String>,
    ) -> Result<Session, LifecycleError> {
        self.begin(session_type, task_id, false)
    }

    /// Start whatever the cycle scheduler currently suggests.
    pub fn start_suggested(&mut self, task_id: Option<String>) -> Result<Session, LifecycleError> {
        self.begin(self.state.suggested_next, task_id, false)
    }

    pub fn pause(&mut self) -> Result<Session, LifecycleError> {
        let session = match self.state.current.as_mut() {
            Some(s) if s.status == SessionStatus::Active => s,
            _ => return Err(LifecycleError::NotRunning),
        };
        self.state.timer.pause()?;
        session.status = SessionStatus::Paused;
        session.pause_count += 1;
        let session = session.clone();
        let remaining = self.remaining_secs();
        tracing::debug!(session_id = %session.id, remaining, "session paused");
        self.events.publish(LifecycleEvent::Paused {
            session: session.clone(),
            remaining_secs: remaining,
        });
        Ok(session)
    }

    pub fn resume(&mut self) -> Result<Session, LifecycleError> {
        let session = match self.state.current.as_mut() {
            Some(s) if s.status == SessionStatus::Paused => s,
            _ => return Err(LifecycleError::NotPaused),
        };
        self.state.timer.resume()?;
        session.status = SessionStatus::Active;
        let session = session.clone();
        let remaining = self.remaining_secs();
        tracing::debug!(session_id = %session.id, remaining, "session resumed");
        self.events.publish(LifecycleEvent::Resumed {
            session: session.clone(),
            remaining_secs: remaining,
        });
        Ok(session)
    }

    /// Abandon the current session, recording it as interrupted.
    pub fn reset(&mut self) -> Result<Session, LifecycleError> {
        self.interrupt(None)
    }

    /// Like [`reset`](Self::reset), attaching `notes` to the record.
    pub fn interrupt(&mut self, notes: Option<String>) -> Result<Session, LifecycleError> {
        let mut session = self
            .state
            .current
            .take()
            .ok_or(LifecycleError::NoActiveSession)?;
        let actual = session
            .planned_duration
            .saturating_sub(self.state.timer.remaining_secs());
        if notes.is_some() {
            session.notes = notes;
        }
        session.finish(SessionStatus::Interrupted, actual, self.clock.now());
        self.state.timer.reset();
        tracing::debug!(session_id = %session.id, actual, "session interrupted");

        self.events.publish(LifecycleEvent::Interrupted {
            session: session.clone(),
        });
        self.persist(&session);
        Ok(session)
    }

    /// Attach free-text notes to the session in progress.
    pub fn annotate(&mut self, notes: impl Into<String>) -> Result<(), LifecycleError> {
        let session = self
            .state
            .current
            .as_mut()
            .ok_or(LifecycleError::NoActiveSession)?;
        session.notes = Some(notes.into());
        Ok(())
    }

    /// Drop a pending break suggestion. No session record is created.
    pub fn skip_break(&mut self) -> Result<SessionType, LifecycleError> {
        let skipped = self.state.suggested_next;
        if self.state.current.is_some() || !skipped.is_break() {
            return Err(LifecycleError::NoPendingBreak);
        }
        self.state.suggested_next = SessionType::Work;
        self.state.pending_auto_start = None;
        self.state.consecutive_auto_starts = 0;
        tracing::debug!(skipped = skipped.as_str(), "break skipped");
        self.events.publish(LifecycleEvent::BreakSkipped {
            skipped,
            next_suggested: SessionType::Work,
            at: self.clock.now(),
        });
        self.arm_auto_start(SessionType::Work);
        self.fire_due_auto_start();
        Ok(SessionType::Work)
    }

    /// Advance by one clock tick. Returns the events this tick produced.
    pub fn tick(&mut self) -> Vec<LifecycleEvent> {
        if self.state.current.is_some() {
            return match self.state.timer.tick() {
                Some(TimerEvent::Expired) => self.complete_current(),
                None => Vec::new(),
            };
        }

        if let Some(pending) = self.state.pending_auto_start.as_mut() {
            pending.ticks_remaining = pending.ticks_remaining.saturating_sub(1);
        }
        self.fire_due_auto_start().into_iter().collect()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(
        &mut self,
        session_type: SessionType,
        task_id: Option<String>,
        auto: bool,
    ) -> Result<Session, LifecycleError> {
        if self.state.current.is_some() {
            return Err(LifecycleError::SlotOccupied);
        }
        let planned = self.options.duration_for(session_type);
        self.state.timer.start(planned)?;

        let session = Session::begin(session_type, task_id, planned, self.clock.now());
        if session_type == SessionType::Work {
            self.state.last_work_task = session.task_id.clone();
        }
        self.state.pending_auto_start = None;
        if auto {
            self.state.consecutive_auto_starts += 1;
        } else {
            self.state.consecutive_auto_starts = 0;
        }
        self.state.current = Some(session.clone());

        tracing::debug!(
            session_id = %session.id,
            session_type = session_type.as_str(),
            planned,
            auto,
            "session started"
        );
        self.events.publish(LifecycleEvent::Started {
            session: session.clone(),
            auto,
        });
        Ok(session)
    }

    fn complete_current(&mut self) -> Vec<LifecycleEvent> {
        self.state.timer.reset();
        let Some(mut session) = self.state.current.take() else {
            return Vec::new();
        };
        session.finish(SessionStatus::Completed, session.planned_duration, self.clock.now());

        if session.session_type == SessionType::Work {
            self.state.cycle.record_work_completion();
        }
        let next = suggestion_after(session.session_type, &self.state.cycle);
        self.state.suggested_next = next;
        tracing::debug!(
            session_id = %session.id,
            session_type = session.session_type.as_str(),
            completed_work = self.state.cycle.completed_work_count,
            next = next.as_str(),
            "session completed"
        );

        let completed = LifecycleEvent::Completed {
            session: session.clone(),
            next_suggested: next,
        };
        self.events.publish(completed.clone());

        // The transition is already visible; storage and hooks follow.
        self.persist(&session);
        self.run_completion_hooks(&session, next);

        let mut emitted = vec![completed];
        self.arm_auto_start(next);
        emitted.extend(self.fire_due_auto_start());
        emitted
    }

    fn run_completion_hooks(&self, session: &Session, next: SessionType) {
        if session.session_type == SessionType::Work {
            if let Some(task_id) = session.task_id.as_deref() {
                if let Err(e) = self.tasks.on_work_session_completed(task_id) {
                    tracing::warn!(
                        session_id = %session.id,
                        task_id,
                        error = %e,
                        "task progress hook failed"
                    );
                }
            }
        }
        let completed_work = self.state.cycle.completed_work_count;
        let (kind, payload) = NotificationPayload::for_completion(session, next, completed_work);
        if let Err(e) = self.notifier.notify(kind, &payload) {
            tracing::warn!(session_id = %session.id, ?kind, error = %e, "notification hook failed");
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.store.append(session) {
            tracing::error!(session_id = %session.id, error = %e, "failed to store session record");
        }
    }

    fn arm_auto_start(&mut self, next: SessionType) {
        if !self.options.auto_start_enabled(next) {
            return;
        }
        if let Some(cap) = self.options.max_auto_cycles {
            if self.state.consecutive_auto_starts >= cap {
                tracing::info!(
                    cap,
                    next = next.as_str(),
                    "auto-start cap reached, waiting for explicit start"
                );
                return;
            }
        }
        self.state.pending_auto_start = Some(PendingAutoStart {
            session_type: next,
            ticks_remaining: self.options.auto_start_settle_secs,
        });
    }

    fn fire_due_auto_start(&mut self) -> Option<LifecycleEvent> {
        let pending = self.state.pending_auto_start?;
        if pending.ticks_remaining > 0 {
            return None;
        }
        self.state.pending_auto_start = None;
        let task_id = match pending.session_type {
            SessionType::Work => self.state.last_work_task.clone(),
            _ => None,
        };
        match self.begin(pending.session_type, task_id, true) {
            Ok(session) => Some(LifecycleEvent::Started { session, auto: true }),
            Err(e) => {
                tracing::warn!(error = %e, "auto-start failed");
                None
            }
        }
    }
}
