//! End-to-end lifecycle tests against the SQLite store.
//!
//! A manual clock stands in for wall time; every tick advances it by one
//! second, the way the CLI host replays elapsed time.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pomocycle_core::{
    Clock, Database, FocusStats, LifecycleError, LifecycleEvent, ManualClock, SessionManager,
    SessionStatus, SessionStore, SessionType, TimerOptions,
};
use proptest::prelude::*;

fn classic() -> TimerOptions {
    TimerOptions {
        work_duration: 1500,
        short_break_duration: 300,
        long_break_duration: 900,
        long_break_interval: 4,
        ..TimerOptions::default()
    }
}

struct Harness {
    manager: SessionManager,
    db: Arc<Database>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new(options: TimerOptions) -> Self {
        let db = Arc::new(Database::open_memory().unwrap());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 6, 8, 0, 0).unwrap(),
        ));
        let manager = SessionManager::new(options, db.clone())
            .with_task_gateway(db.clone())
            .with_clock(clock.clone());
        Self { manager, db, clock }
    }

    fn tick(&mut self, n: u64) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            self.clock.advance_secs(1);
            events.extend(self.manager.tick());
        }
        events
    }

    fn run_to_completion(&mut self) -> Vec<LifecycleEvent> {
        let remaining = self.manager.remaining_secs();
        self.tick(remaining)
    }
}

#[test]
fn four_work_sessions_lead_to_long_break() {
    let mut h = Harness::new(classic());

    for round in 1..=4 {
        h.manager
            .start(SessionType::Work, Some("thesis".into()))
            .unwrap();
        h.run_to_completion();
        assert_eq!(h.manager.cycle().completed_work_count, round);
        if round < 4 {
            assert_eq!(h.manager.suggested_next(), SessionType::ShortBreak);
            h.manager.start_suggested(None).unwrap();
            h.run_to_completion();
            assert_eq!(h.manager.suggested_next(), SessionType::Work);
        }
    }

    assert_eq!(h.manager.suggested_next(), SessionType::LongBreak);
    assert_eq!(h.manager.cycle().sessions_until_long_break(), 4);

    let history = h.db.query_all().unwrap();
    assert_eq!(history.len(), 7);
    assert!(history.iter().all(|s| s.status == SessionStatus::Completed));
    assert_eq!(h.db.task_pomodoros("thesis").unwrap(), 4);

    let stats = FocusStats::new(&history, h.clock.now());
    assert_eq!(stats.completion_rate(), 1.0);
    assert_eq!(stats.today_focus_time(), 4 * 1500);
    assert_eq!(stats.streak_days(), 1);
    assert_eq!(stats.best_working_hour(), Some(8));
}

#[test]
fn reset_after_ten_ticks_records_interruption() {
    let mut h = Harness::new(classic());
    h.manager.start(SessionType::Work, Some("thesis".into())).unwrap();
    h.tick(10);
    let session = h.manager.reset().unwrap();

    assert_eq!(session.status, SessionStatus::Interrupted);
    assert_eq!(session.actual_duration, Some(10));
    assert_eq!(h.manager.cycle().completed_work_count, 0);
    assert_eq!(h.db.task_pomodoros("thesis").unwrap(), 0);

    let history = h.db.query_all().unwrap();
    assert_eq!(history, vec![session]);
    assert_eq!(FocusStats::new(&history, h.clock.now()).completion_rate(), 0.0);
}

#[test]
fn pause_does_not_leak_time_into_history() {
    let mut h = Harness::new(classic());
    h.manager.start(SessionType::Work, None).unwrap();
    h.tick(600);
    h.manager.pause().unwrap();
    h.tick(3600);
    h.manager.resume().unwrap();
    h.run_to_completion();

    let history = h.db.query_all().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].actual_duration, Some(1500));
    assert_eq!(history[0].pause_count, 1);
}

#[test]
fn unattended_cycle_runs_until_capped() {
    let mut h = Harness::new(TimerOptions {
        work_duration: 10,
        short_break_duration: 2,
        long_break_duration: 5,
        long_break_interval: 2,
        auto_start_breaks: true,
        auto_start_work: true,
        auto_start_settle_secs: 1,
        max_auto_cycles: Some(5),
    });
    h.manager.start(SessionType::Work, Some("inbox".into())).unwrap();
    h.tick(200);

    assert!(h.manager.is_idle());
    let history = h.db.query_all().unwrap();
    let types: Vec<_> = history.iter().map(|s| s.session_type).collect();
    assert_eq!(
        types,
        vec![
            SessionType::Work,
            SessionType::ShortBreak,
            SessionType::Work,
            SessionType::LongBreak,
            SessionType::Work,
            SessionType::ShortBreak,
        ]
    );
    assert_eq!(h.db.task_pomodoros("inbox").unwrap(), 3);
    assert_eq!(h.manager.suggested_next(), SessionType::Work);
}

#[test]
fn skipped_break_leaves_no_record() {
    let mut h = Harness::new(classic());
    h.manager.start(SessionType::Work, None).unwrap();
    h.run_to_completion();
    h.manager.skip_break().unwrap();
    assert_eq!(h.manager.skip_break(), Err(LifecycleError::NoPendingBreak));
    h.manager.start_suggested(None).unwrap();
    assert_eq!(h.manager.current().unwrap().session_type, SessionType::Work);
    assert_eq!(h.db.query_all().unwrap().len(), 1);
}

#[test]
fn manager_state_survives_process_restart() {
    let mut h = Harness::new(classic());
    h.manager.start(SessionType::Work, None).unwrap();
    h.run_to_completion();
    h.manager.start_suggested(None).unwrap();
    h.tick(100);

    h.db
        .kv_set("state", &serde_json::to_string(&h.manager.snapshot()).unwrap())
        .unwrap();
    let saved = h.db.kv_get("state").unwrap().unwrap();
    let state = serde_json::from_str(&saved).unwrap();
    let restored =
        SessionManager::restore(classic(), h.db.clone(), state).with_clock(h.clock.clone());

    assert_eq!(restored.remaining_secs(), 200);
    assert_eq!(restored.current().unwrap().session_type, SessionType::ShortBreak);
    assert_eq!(restored.cycle().completed_work_count, 1);
}

proptest! {
    #[test]
    fn completed_count_tracks_natural_expiries(
        outcomes in prop::collection::vec(any::<bool>(), 0..12)
    ) {
        let mut h = Harness::new(TimerOptions {
            work_duration: 3,
            short_break_duration: 1,
            long_break_duration: 1,
            long_break_interval: 4,
            ..TimerOptions::default()
        });
        let mut completed = 0u32;
        for finish in outcomes {
            h.manager.start(SessionType::Work, None).unwrap();
            if finish {
                h.run_to_completion();
                completed += 1;
                let expected = if completed % 4 == 0 {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                };
                prop_assert_eq!(h.manager.suggested_next(), expected);
            } else {
                h.tick(1);
                h.manager.reset().unwrap();
            }
            prop_assert_eq!(h.manager.cycle().completed_work_count, completed);
        }
    }
}
