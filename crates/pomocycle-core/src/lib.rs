//! # Pomocycle Core Library
//!
//! Core logic for the pomocycle focus timer. All operations are available
//! through the standalone `pomocycle` CLI, which is a thin host over this
//! library: it supplies the one-second ticks and persists state between runs.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven countdown; the caller invokes `tick()`
//!   once per second
//! - **Session Lifecycle**: a single-slot manager that records completed and
//!   interrupted sessions and drives auto-start
//! - **Cycle Scheduling**: short and long break suggestions
//! - **Statistics**: completion rate, focus time, streaks and hourly patterns
//! - **Storage**: SQLite session history and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionManager`]: lifecycle state machine around [`TimerEngine`]
//! - [`FocusStats`]: read-only view over stored history
//! - [`Database`]: session persistence and task progress counters
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, GatewayError, LifecycleError, StoreError, TimerError};
pub use events::{EventBus, LifecycleEvent};
pub use session::{
    LogNotifier, ManagerState, NoopGateway, NotificationGateway, NotificationKind,
    NotificationPayload, PendingAutoStart, Session, SessionManager, SessionStatus, SessionType,
    SharedSessionManager, StatusSnapshot, TaskProgressGateway, TimerOptions,
};
pub use stats::{DailySummary, FocusReport, FocusStats, RangeSummary};
pub use storage::{Config, Database, MemorySessionStore, RetryPolicy, RetryingStore, SessionStore};
pub use timer::{Clock, CycleState, ManualClock, SystemClock, TimerEngine, TimerEvent, TimerState};
