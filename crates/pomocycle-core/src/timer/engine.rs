//! Timer engine implementation.
//!
//! The timer engine is a tick-driven countdown. It does not use internal
//! threads or read the wall clock - the caller (the host's clock source)
//! is responsible for calling `tick()` once per second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Expired
//!   ^                                          |
//!   +---------------- reset / start -----------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start(1500)?;
//! // Once per clock tick:
//! if let Some(TimerEvent::Expired) = engine.tick() { /* ... */ }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero. Further ticks are ignored until restarted.
    Expired,
}

/// Signal produced by [`TimerEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    Expired,
}

/// Core countdown, measured in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    /// Length of the current countdown in seconds.
    duration_secs: u64,
    remaining_secs: u64,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            duration_secs: 0,
            remaining_secs: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Seconds consumed from the current countdown.
    pub fn elapsed_secs(&self) -> u64 {
        self.duration_secs.saturating_sub(self.remaining_secs)
    }

    /// True while a countdown is running or paused.
    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Running | TimerState::Paused)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, duration_secs: u64) -> Result<(), TimerError> {
        if self.is_active() {
            return Err(TimerError::AlreadyRunning);
        }
        self.state = TimerState::Running;
        self.duration_secs = duration_secs;
        self.remaining_secs = duration_secs;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Ok(())
            }
            _ => Err(TimerError::NotRunning),
        }
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                Ok(())
            }
            _ => Err(TimerError::NotPaused),
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.duration_secs = 0;
        self.remaining_secs = 0;
    }

    /// Call once per clock tick. Returns `Some(TimerEvent::Expired)` exactly
    /// once, on the tick that exhausts the countdown.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            return Some(TimerEvent::Expired);
        }
        None
    }
}
