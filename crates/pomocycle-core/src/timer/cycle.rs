//! Work/break cycle scheduling.
//!
//! Work sessions alternate with short breaks; every `long_break_interval`
//! completed work sessions the break becomes a long one.

use serde::{Deserialize, Serialize};

use crate::session::SessionType;

/// Suggested type right after a work session completes.
///
/// `completed_work_count` already includes the session that just finished.
/// An interval of 0 never yields a long break.
pub fn next_session_type(completed_work_count: u32, long_break_interval: u32) -> SessionType {
    if long_break_interval > 0
        && completed_work_count > 0
        && completed_work_count % long_break_interval == 0
    {
        SessionType::LongBreak
    } else {
        SessionType::ShortBreak
    }
}

/// Suggested type after a session of `finished` type ends naturally.
pub fn suggestion_after(finished: SessionType, state: &CycleState) -> SessionType {
    match finished {
        SessionType::Work => {
            next_session_type(state.completed_work_count, state.long_break_interval)
        }
        SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
    }
}

/// Rolling cycle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    pub completed_work_count: u32,
    pub long_break_interval: u32,
}

impl CycleState {
    pub fn new(long_break_interval: u32) -> Self {
        Self {
            completed_work_count: 0,
            long_break_interval,
        }
    }

    /// Count a naturally completed work session and return the break to take.
    pub fn record_work_completion(&mut self) -> SessionType {
        self.completed_work_count = self.completed_work_count.saturating_add(1);
        next_session_type(self.completed_work_count, self.long_break_interval)
    }

    /// Work sessions left before the next long break (0 when disabled).
    pub fn sessions_until_long_break(&self) -> u32 {
        if self.long_break_interval == 0 {
            return 0;
        }
        self.long_break_interval - self.completed_work_count % self.long_break_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn every_fourth_work_earns_long_break() {
        let mut state = CycleState::new(4);
        let suggestions: Vec<_> = (0..8).map(|_| state.record_work_completion()).collect();
        assert_eq!(
            suggestions,
            vec![
                SessionType::ShortBreak,
                SessionType::ShortBreak,
                SessionType::ShortBreak,
                SessionType::LongBreak,
                SessionType::ShortBreak,
                SessionType::ShortBreak,
                SessionType::ShortBreak,
                SessionType::LongBreak,
            ]
        );
        assert_eq!(state.completed_work_count, 8);
    }

    #[test]
    fn zero_count_is_never_long() {
        assert_eq!(next_session_type(0, 4), SessionType::ShortBreak);
    }

    #[test]
    fn zero_interval_disables_long_breaks() {
        assert_eq!(next_session_type(4, 0), SessionType::ShortBreak);
        assert_eq!(CycleState::new(0).sessions_until_long_break(), 0);
    }

    #[test]
    fn breaks_are_followed_by_work() {
        let state = CycleState::new(4);
        assert_eq!(suggestion_after(SessionType::ShortBreak, &state), SessionType::Work);
        assert_eq!(suggestion_after(SessionType::LongBreak, &state), SessionType::Work);
    }

    #[test]
    fn sessions_until_long_break_counts_down() {
        let mut state = CycleState::new(4);
        assert_eq!(state.sessions_until_long_break(), 4);
        state.record_work_completion();
        assert_eq!(state.sessions_until_long_break(), 3);
        for _ in 0..3 {
            state.record_work_completion();
        }
        assert_eq!(state.sessions_until_long_break(), 4);
    }

    proptest! {
        #[test]
        fn long_break_only_on_multiples(count in 1u32..10_000, interval in 1u32..12) {
            let expected = if count % interval == 0 {
                SessionType::LongBreak
            } else {
                SessionType::ShortBreak
            };
            prop_assert_eq!(next_session_type(count, interval), expected);
        }
    }
}
