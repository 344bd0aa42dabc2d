use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_break(self) -> bool {
        !matches!(self, SessionType::Work)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "short_break",
            SessionType::LongBreak => "long_break",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "work" | "focus" => Some(SessionType::Work),
            "short_break" | "short" => Some(SessionType::ShortBreak),
            "long_break" | "long" => Some(SessionType::LongBreak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Interrupted,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Interrupted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Interrupted => "interrupted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(SessionStatus::Active),
            "paused" => Some(SessionStatus::Paused),
            "completed" => Some(SessionStatus::Completed),
            "interrupted" => Some(SessionStatus::Interrupted),
            _ => None,
        }
    }
}

/// One work or break interval.
///
/// Created and mutated only by the lifecycle manager; immutable once its
/// status is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Externally owned task. Always `None` for breaks.
    pub task_id: Option<String>,
    pub session_type: SessionType,
    /// Seconds.
    pub planned_duration: u64,
    /// Seconds actually counted down; set at the terminal transition.
    pub actual_duration: Option<u64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub pause_count: u32,
}

impl Session {
    pub(crate) fn begin(
        session_type: SessionType,
        task_id: Option<String>,
        planned_duration: u64,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: if session_type.is_break() { None } else { task_id },
            session_type,
            planned_duration,
            actual_duration: None,
            start_time,
            end_time: None,
            status: SessionStatus::Active,
            notes: None,
            pause_count: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_completed_work(&self) -> bool {
        self.session_type == SessionType::Work && self.status == SessionStatus::Completed
    }

    pub fn is_interrupted_work(&self) -> bool {
        self.session_type == SessionType::Work && self.status == SessionStatus::Interrupted
    }

    /// 0.0 .. 100.0 progress given the countdown's remaining seconds.
    pub fn progress_pct(&self, remaining_secs: u64) -> f64 {
        if self.planned_duration == 0 {
            return 100.0;
        }
        let elapsed = self.planned_duration.saturating_sub(remaining_secs);
        (elapsed as f64 / self.planned_duration as f64 * 100.0).min(100.0)
    }

    pub(crate) fn finish(
        &mut self,
        status: SessionStatus,
        actual_duration: u64,
        end_time: DateTime<Utc>,
    ) {
        self.status = status;
        self.actual_duration = Some(actual_duration.min(self.planned_duration));
        self.end_time = Some(end_time.max(self.start_time));
    }
}
