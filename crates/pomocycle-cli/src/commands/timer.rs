use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use pomocycle_core::storage::Database;
use pomocycle_core::{
    Config, CoreError, LifecycleError, LifecycleEvent, LogNotifier, ManagerState, ManualClock,
    NoopGateway, NotificationGateway, RetryPolicy, RetryingStore, SessionManager, SessionStore,
    SessionType,
};
use tokio::sync::broadcast::{self, error::TryRecvError};

const STATE_KEY: &str = "manager_state";
const LAST_TICK_KEY: &str = "last_tick_at";

/// Wall-clock gaps longer than this are not replayed tick by tick.
const MAX_REPLAY_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session
    Start {
        /// work, short-break or long-break
        #[arg(long = "type", default_value = "work", value_parser = parse_session_type)]
        session_type: SessionType,
        /// Task to credit when a work session completes
        #[arg(long)]
        task: Option<String>,
    },
    /// Start the suggested next session
    Next {
        #[arg(long)]
        task: Option<String>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Abandon the current session
    Reset {
        /// Notes to keep with the interrupted session
        #[arg(long)]
        notes: Option<String>,
    },
    /// Skip the suggested break
    SkipBreak,
    /// Advance the timer by whole seconds
    Tick {
        #[arg(long, default_value_t = 1)]
        count: u64,
    },
    /// Print current timer state as JSON
    Status,
}

fn parse_session_type(raw: &str) -> Result<SessionType, String> {
    SessionType::parse(raw).ok_or_else(|| {
        format!("unknown session type '{raw}' (expected work, short-break or long-break)")
    })
}

fn load_state(db: &Database) -> Option<ManagerState> {
    let json = db.kv_get(STATE_KEY).ok()??;
    match serde_json::from_str(&json) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable timer state");
            None
        }
    }
}

fn load_last_tick(db: &Database) -> Option<DateTime<Utc>> {
    let raw = db.kv_get(LAST_TICK_KEY).ok()??;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

fn save(
    db: &Database,
    manager: &SessionManager,
    last_tick: DateTime<Utc>,
) -> Result<(), CoreError> {
    let json = serde_json::to_string(&manager.snapshot())?;
    db.kv_set(STATE_KEY, &json)?;
    db.kv_set(LAST_TICK_KEY, &last_tick.to_rfc3339())?;
    Ok(())
}

fn build_manager(db: &Arc<Database>, config: &Config, clock: Arc<ManualClock>) -> SessionManager {
    let options = config.timer_options();
    let store: Arc<dyn SessionStore> =
        Arc::new(RetryingStore::new(db.clone(), RetryPolicy::default()));
    let notifier: Arc<dyn NotificationGateway> = if config.notifications.enabled {
        Arc::new(LogNotifier)
    } else {
        Arc::new(NoopGateway)
    };
    let manager = match load_state(db) {
        Some(state) => SessionManager::restore(options, store, state),
        None => SessionManager::new(options, store),
    };
    manager
        .with_task_gateway(db.clone())
        .with_notifier(notifier)
        .with_clock(clock)
}

/// Replay the whole seconds elapsed since the last recorded tick, so the
/// timer catches up with wall time before the command applies. Events the
/// replay produces are appended to `events`. Returns the timestamp to record
/// as the new last tick.
fn catch_up(
    manager: &mut SessionManager,
    clock: &ManualClock,
    last_tick: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    events: &mut Vec<LifecycleEvent>,
) -> DateTime<Utc> {
    let Some(last) = last_tick else {
        return now;
    };
    let elapsed = (now - last).num_seconds();
    if elapsed <= 0 {
        return last;
    }
    let replay = elapsed.min(MAX_REPLAY_SECS);
    clock.set(last);
    for _ in 0..replay {
        if manager.is_idle() && manager.pending_auto_start().is_none() {
            break;
        }
        clock.advance_secs(1);
        events.extend(manager.tick());
    }
    tracing::debug!(elapsed, replay, "replayed elapsed time");
    clock.set(now);
    if elapsed > MAX_REPLAY_SECS {
        now
    } else {
        last + Duration::seconds(elapsed)
    }
}

/// Collect what a single command published. Commands emit at most a
/// couple of events, well inside the channel's capacity.
fn drain(rx: &mut broadcast::Receiver<LifecycleEvent>, events: &mut Vec<LifecycleEvent>) {
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(missed)) => {
                tracing::warn!(missed, "command events dropped");
            }
            Err(_) => break,
        }
    }
}

pub fn run(action: TimerAction) -> Result<(), CoreError> {
    let db = Arc::new(Database::open()?);
    let config = Config::load_or_default();
    let now = Utc::now();
    let clock = Arc::new(ManualClock::new(now));
    let mut manager = build_manager(&db, &config, clock.clone());

    let mut events = Vec::new();
    let last_tick = catch_up(&mut manager, &clock, load_last_tick(&db), now, &mut events);

    // Ticks hand back their own events; only commands go through the channel.
    let mut rx = (!matches!(action, TimerAction::Tick { .. })).then(|| manager.subscribe());
    let outcome: Result<(), LifecycleError> = match action {
        TimerAction::Start { session_type, task } => manager.start(session_type, task).map(drop),
        TimerAction::Next { task } => manager.start_suggested(task).map(drop),
        TimerAction::Pause => manager.pause().map(drop),
        TimerAction::Resume => manager.resume().map(drop),
        TimerAction::Reset { notes } => manager.interrupt(notes).map(drop),
        TimerAction::SkipBreak => manager.skip_break().map(drop),
        TimerAction::Tick { count } => {
            for _ in 0..count {
                clock.advance_secs(1);
                events.extend(manager.tick());
            }
            Ok(())
        }
        TimerAction::Status => Ok(()),
    };

    // Replayed ticks may already have recorded sessions; keep them even
    // when the command itself is rejected.
    save(&db, &manager, last_tick)?;
    outcome?;

    if let Some(rx) = rx.as_mut() {
        drain(rx, &mut events);
    }
    let output = serde_json::json!({
        "events": events,
        "status": manager.status(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
