//! Sessions: the data model, the lifecycle manager that owns the active
//! slot, and the outbound gateways notified when a session completes.

mod gateway;
mod lifecycle;
mod model;

pub use gateway::{
    LogNotifier, NoopGateway, NotificationGateway, NotificationKind, NotificationPayload,
    TaskProgressGateway,
};
pub use lifecycle::{
    ManagerState, PendingAutoStart, SessionManager, SharedSessionManager, StatusSnapshot,
    TimerOptions,
};
pub use model::{Session, SessionStatus, SessionType};
