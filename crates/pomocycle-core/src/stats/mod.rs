//! Statistics over recorded sessions.
//!
//! Everything here is computed on demand from the history returned by the
//! session store; nothing is cached or written back.

mod focus;

pub use focus::{DailySummary, FocusReport, FocusStats, RangeSummary};
