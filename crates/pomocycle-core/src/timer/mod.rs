mod clock;
mod cycle;
mod engine;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cycle::{next_session_type, suggestion_after, CycleState};
pub use engine::{TimerEngine, TimerEvent, TimerState};
