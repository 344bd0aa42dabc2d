//! Focus statistics over stored session history.
//!
//! [`FocusStats`] is a read-only view: it borrows the history returned by
//! [`SessionStore::query_all`](crate::storage::SessionStore::query_all) and
//! evaluates calendar days and hours in the timezone of `now`.
//!
//! Only completed work sessions count as pomodoros. Interrupted work
//! sessions never count as completed but do appear in the completion-rate
//! denominator. Breaks are ignored except for break time in daily summaries.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionStatus};

/// Totals for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Completed work sessions
    pub completed_pomodoros: u32,
    /// Interrupted work sessions
    pub interrupted: u32,
    /// Seconds of completed work
    pub focus_secs: u64,
    /// Seconds of completed breaks
    pub break_secs: u64,
}

/// Work and break totals over an inclusive range of local dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Terminal sessions of any type
    pub total_sessions: u32,
    pub completed_pomodoros: u32,
    pub interrupted: u32,
    pub focus_secs: u64,
    /// Mean actual length of attempted work sessions, in seconds
    pub average_session_secs: u64,
    pub completion_rate: f64,
    pub interruption_rate: f64,
    pub break_secs: u64,
}

/// Everything the stats commands print, in one serializable bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusReport {
    pub today: DailySummary,
    pub total_completed: u32,
    pub total_focus_secs: u64,
    /// Ratio of completed to attempted work sessions (0.0 to 1.0)
    pub completion_rate: f64,
    pub streak_days: u32,
    pub longest_streak: u32,
    pub best_working_hour: Option<u32>,
    /// Monday first
    pub weekly_trend: [u32; 7],
    pub hourly_distribution: [u32; 24],
}

pub struct FocusStats<'a, Tz: TimeZone> {
    sessions: &'a [Session],
    now: DateTime<Tz>,
}

impl<'a, Tz: TimeZone> FocusStats<'a, Tz> {
    pub fn new(sessions: &'a [Session], now: DateTime<Tz>) -> Self {
        Self { sessions, now }
    }

    fn local(&self, at: &DateTime<Utc>) -> DateTime<Tz> {
        at.with_timezone(&self.now.timezone())
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn completed_work(&self) -> impl Iterator<Item = &'a Session> + '_ {
        self.sessions.iter().filter(|s| s.is_completed_work())
    }

    fn focus_secs(session: &Session) -> u64 {
        session.actual_duration.unwrap_or(0)
    }

    /// Calendar days (local) with at least one completed work session.
    fn active_days(&self) -> BTreeSet<NaiveDate> {
        self.completed_work()
            .map(|s| self.local(&s.start_time).date_naive())
            .collect()
    }

    pub fn total_completed(&self) -> u32 {
        self.completed_work().count() as u32
    }

    /// Completed / (completed + interrupted) over work sessions; 0.0 when
    /// no work has been attempted.
    pub fn completion_rate(&self) -> f64 {
        let completed = self.total_completed();
        let interrupted = self
            .sessions
            .iter()
            .filter(|s| s.is_interrupted_work())
            .count() as u32;
        let attempted = completed + interrupted;
        if attempted == 0 {
            return 0.0;
        }
        completed as f64 / attempted as f64
    }

    /// Seconds of completed work that started today.
    pub fn today_focus_time(&self) -> u64 {
        let today = self.today();
        self.completed_work()
            .filter(|s| self.local(&s.start_time).date_naive() == today)
            .map(Self::focus_secs)
            .sum()
    }

    pub fn total_focus_time(&self) -> u64 {
        self.completed_work().map(Self::focus_secs).sum()
    }

    /// Consecutive days ending today with completed work. A day without
    /// any breaks the streak, including today.
    pub fn streak_days(&self) -> u32 {
        let days = self.active_days();
        let mut day = self.today();
        let mut streak = 0;
        while days.contains(&day) {
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        streak
    }

    /// Longest run of consecutive active days anywhere in history.
    pub fn longest_streak(&self) -> u32 {
        let mut longest = 0;
        let mut run = 0;
        let mut prev: Option<NaiveDate> = None;
        for day in self.active_days() {
            run = match prev {
                Some(p) if p.succ_opt() == Some(day) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            prev = Some(day);
        }
        longest
    }

    /// Completed work per local hour of day, across all history.
    pub fn hourly_distribution(&self) -> [u32; 24] {
        let mut hours = [0u32; 24];
        for s in self.completed_work() {
            hours[self.local(&s.start_time).hour() as usize] += 1;
        }
        hours
    }

    /// The hour with the most completed work. Ties go to the earliest hour.
    pub fn best_working_hour(&self) -> Option<u32> {
        let mut best: Option<(u32, u32)> = None;
        for (hour, &count) in self.hourly_distribution().iter().enumerate() {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((hour as u32, count));
            }
        }
        best.map(|(hour, _)| hour)
    }

    /// Completed work per weekday over the seven days ending today,
    /// indexed Monday = 0.
    pub fn weekly_trend(&self) -> [u32; 7] {
        let today = self.today();
        let window_start = today - Duration::days(6);
        let mut week = [0u32; 7];
        for s in self.completed_work() {
            let day = self.local(&s.start_time).date_naive();
            if day >= window_start && day <= today {
                week[day.weekday().num_days_from_monday() as usize] += 1;
            }
        }
        week
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        let mut summary = DailySummary {
            date,
            completed_pomodoros: 0,
            interrupted: 0,
            focus_secs: 0,
            break_secs: 0,
        };
        for s in self
            .sessions
            .iter()
            .filter(|s| self.local(&s.start_time).date_naive() == date)
        {
            if s.is_completed_work() {
                summary.completed_pomodoros += 1;
                summary.focus_secs += Self::focus_secs(s);
            } else if s.is_interrupted_work() {
                summary.interrupted += 1;
            } else if s.session_type.is_break() && s.status == SessionStatus::Completed {
                summary.break_secs += s.actual_duration.unwrap_or(0);
            }
        }
        summary
    }

    /// Totals for sessions that started between `start` and `end`
    /// (inclusive, local dates). Rates are 0.0 when no work was attempted.
    pub fn range_summary(&self, start: NaiveDate, end: NaiveDate) -> RangeSummary {
        let mut summary = RangeSummary {
            start,
            end,
            total_sessions: 0,
            completed_pomodoros: 0,
            interrupted: 0,
            focus_secs: 0,
            average_session_secs: 0,
            completion_rate: 0.0,
            interruption_rate: 0.0,
            break_secs: 0,
        };
        let mut attempted_secs = 0;
        for s in self.sessions.iter().filter(|s| {
            let day = self.local(&s.start_time).date_naive();
            s.is_terminal() && day >= start && day <= end
        }) {
            summary.total_sessions += 1;
            if s.is_completed_work() {
                summary.completed_pomodoros += 1;
                summary.focus_secs += Self::focus_secs(s);
                attempted_secs += Self::focus_secs(s);
            } else if s.is_interrupted_work() {
                summary.interrupted += 1;
                attempted_secs += s.actual_duration.unwrap_or(0);
            } else if s.session_type.is_break() && s.status == SessionStatus::Completed {
                summary.break_secs += s.actual_duration.unwrap_or(0);
            }
        }
        let attempted = summary.completed_pomodoros + summary.interrupted;
        if attempted > 0 {
            summary.average_session_secs = attempted_secs / u64::from(attempted);
            summary.completion_rate = summary.completed_pomodoros as f64 / attempted as f64;
            summary.interruption_rate = summary.interrupted as f64 / attempted as f64;
        }
        summary
    }

    /// Every stored session credited to `task_id`, oldest first.
    pub fn sessions_for_task(&self, task_id: &str) -> Vec<&'a Session> {
        self.sessions
            .iter()
            .filter(|s| s.task_id.as_deref() == Some(task_id))
            .collect()
    }

    pub fn report(&self) -> FocusReport {
        FocusReport {
            today: self.daily_summary(self.today()),
            total_completed: self.total_completed(),
            total_focus_secs: self.total_focus_time(),
            completion_rate: self.completion_rate(),
            streak_days: self.streak_days(),
            longest_streak: self.longest_streak(),
            best_working_hour: self.best_working_hour(),
            weekly_trend: self.weekly_trend(),
            hourly_distribution: self.hourly_distribution(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionType;
    use chrono::FixedOffset;

    fn utc(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()
    }

    // Thursday
    fn now() -> DateTime<Utc> {
        utc(3, 14, 18)
    }

    fn session(session_type: SessionType, status: SessionStatus, start: DateTime<Utc>) -> Session {
        let planned = match session_type {
            SessionType::Work => 1500,
            SessionType::ShortBreak => 300,
            SessionType::LongBreak => 900,
        };
        let actual = if status == SessionStatus::Completed { planned } else { planned / 3 };
        let mut s = Session::begin(session_type, None, planned, start);
        s.finish(status, actual, start + Duration::seconds(actual as i64));
        s
    }

    fn work(start: DateTime<Utc>) -> Session {
        session(SessionType::Work, SessionStatus::Completed, start)
    }

    fn interrupted(start: DateTime<Utc>) -> Session {
        session(SessionType::Work, SessionStatus::Interrupted, start)
    }

    #[test]
    fn test_empty_history() {
        let stats = FocusStats::new(&[], now());
        assert_eq!(stats.completion_rate(), 0.0);
        assert_eq!(stats.today_focus_time(), 0);
        assert_eq!(stats.streak_days(), 0);
        assert_eq!(stats.longest_streak(), 0);
        assert_eq!(stats.best_working_hour(), None);
        assert_eq!(stats.weekly_trend(), [0; 7]);
    }

    #[test]
    fn test_completion_rate_counts_interruptions() {
        let sessions = vec![
            work(utc(3, 14, 9)),
            work(utc(3, 14, 10)),
            work(utc(3, 14, 11)),
            interrupted(utc(3, 14, 12)),
            session(SessionType::ShortBreak, SessionStatus::Interrupted, utc(3, 14, 13)),
        ];
        let stats = FocusStats::new(&sessions, now());
        assert_eq!(stats.completion_rate(), 0.75);
        assert_eq!(stats.total_completed(), 3);
    }

    #[test]
    fn test_focus_time_today_and_total() {
        let sessions = vec![
            work(utc(3, 13, 9)),
            work(utc(3, 14, 9)),
            interrupted(utc(3, 14, 10)),
            session(SessionType::LongBreak, SessionStatus::Completed, utc(3, 14, 11)),
        ];
        let stats = FocusStats::new(&sessions, now());
        assert_eq!(stats.today_focus_time(), 1500);
        assert_eq!(stats.total_focus_time(), 3000);
    }

    #[test]
    fn test_streak_zero_without_work_today() {
        let sessions: Vec<_> = (0..6).map(|h| work(utc(3, 13, 8 + h))).collect();
        let stats = FocusStats::new(&sessions, now());
        assert_eq!(stats.streak_days(), 0);
        assert_eq!(stats.longest_streak(), 1);
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let sessions = vec![
            work(utc(3, 9, 9)),
            work(utc(3, 10, 9)),
            work(utc(3, 11, 9)),
            // gap on the 12th
            work(utc(3, 13, 9)),
            work(utc(3, 14, 9)),
            work(utc(3, 14, 15)),
            interrupted(utc(3, 12, 9)),
        ];
        let stats = FocusStats::new(&sessions, now());
        assert_eq!(stats.streak_days(), 2);
        assert_eq!(stats.longest_streak(), 3);
    }

    #[test]
    fn test_hourly_distribution_sums_to_completed() {
        let sessions = vec![
            work(utc(3, 1, 9)),
            work(utc(3, 5, 9)),
            work(utc(3, 14, 14)),
            interrupted(utc(3, 14, 15)),
        ];
        let stats = FocusStats::new(&sessions, now());
        let hours = stats.hourly_distribution();
        assert_eq!(hours[9], 2);
        assert_eq!(hours[14], 1);
        assert_eq!(hours.iter().sum::<u32>(), stats.total_completed());
    }

    #[test]
    fn test_best_hour_ties_to_earliest() {
        let sessions = vec![
            work(utc(3, 14, 16)),
            work(utc(3, 13, 16)),
            work(utc(3, 14, 8)),
            work(utc(3, 13, 8)),
            work(utc(3, 12, 11)),
        ];
        let stats = FocusStats::new(&sessions, now());
        assert_eq!(stats.best_working_hour(), Some(8));
    }

    #[test]
    fn test_weekly_trend_monday_first() {
        let sessions = vec![
            work(utc(3, 7, 9)), // Thursday a week ago, outside the window
            work(utc(3, 8, 9)), // Friday
            work(utc(3, 11, 9)), // Monday
            work(utc(3, 11, 10)),
            work(utc(3, 14, 9)), // Thursday (today)
        ];
        let stats = FocusStats::new(&sessions, now());
        assert_eq!(stats.weekly_trend(), [2, 0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_days_follow_timezone_of_now() {
        // 20:00 UTC on the 13th is 05:00 on the 14th in UTC+9.
        let sessions = vec![work(utc(3, 13, 20))];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let morning = utc(3, 14, 1);
        let stats = FocusStats::new(&sessions, morning.with_timezone(&tokyo));
        assert_eq!(stats.today_focus_time(), 1500);
        assert_eq!(stats.streak_days(), 1);
        assert_eq!(stats.best_working_hour(), Some(5));

        let utc_stats = FocusStats::new(&sessions, morning);
        assert_eq!(utc_stats.today_focus_time(), 0);
        assert_eq!(utc_stats.best_working_hour(), Some(20));
    }

    #[test]
    fn test_daily_summary() {
        let sessions = vec![
            work(utc(3, 14, 9)),
            work(utc(3, 14, 10)),
            interrupted(utc(3, 14, 11)),
            session(SessionType::ShortBreak, SessionStatus::Completed, utc(3, 14, 12)),
            session(SessionType::ShortBreak, SessionStatus::Interrupted, utc(3, 14, 13)),
            work(utc(3, 13, 9)),
        ];
        let stats = FocusStats::new(&sessions, now());
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        assert_eq!(
            stats.daily_summary(day),
            DailySummary {
                date: day,
                completed_pomodoros: 2,
                interrupted: 1,
                focus_secs: 3000,
                break_secs: 300,
            }
        );
    }

    #[test]
    fn test_range_summary() {
        let sessions = vec![
            work(utc(3, 10, 9)),
            work(utc(3, 12, 9)),
            interrupted(utc(3, 12, 10)),
            session(SessionType::ShortBreak, SessionStatus::Completed, utc(3, 12, 11)),
            session(SessionType::LongBreak, SessionStatus::Interrupted, utc(3, 13, 9)),
            work(utc(3, 13, 10)),
            work(utc(3, 14, 9)),
        ];
        let stats = FocusStats::new(&sessions, now());
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let range = stats.range_summary(day(11), day(13));

        assert_eq!(range.total_sessions, 5);
        assert_eq!(range.completed_pomodoros, 2);
        assert_eq!(range.interrupted, 1);
        assert_eq!(range.focus_secs, 3000);
        // (1500 + 1500 + 500) / 3
        assert_eq!(range.average_session_secs, 1166);
        assert!((range.completion_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((range.interruption_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(range.break_secs, 300);
    }

    #[test]
    fn test_range_summary_without_work() {
        let sessions = vec![session(
            SessionType::ShortBreak,
            SessionStatus::Completed,
            utc(3, 14, 9),
        )];
        let stats = FocusStats::new(&sessions, now());
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let range = stats.range_summary(today, today);
        assert_eq!(range.total_sessions, 1);
        assert_eq!(range.average_session_secs, 0);
        assert_eq!(range.completion_rate, 0.0);
        assert_eq!(range.interruption_rate, 0.0);
        assert_eq!(range.break_secs, 300);
    }

    #[test]
    fn test_sessions_for_task() {
        let for_task = |task: &str, start| {
            let mut s = work(start);
            s.task_id = Some(task.to_string());
            s
        };
        let sessions = vec![
            for_task("essay", utc(3, 12, 9)),
            for_task("inbox", utc(3, 12, 10)),
            work(utc(3, 13, 9)),
            for_task("essay", utc(3, 14, 9)),
        ];
        let stats = FocusStats::new(&sessions, now());
        let essay = stats.sessions_for_task("essay");
        assert_eq!(essay.len(), 2);
        assert!(essay[0].start_time < essay[1].start_time);
        assert!(stats.sessions_for_task("nothing").is_empty());
    }

    #[test]
    fn test_report_serialization() {
        let sessions = vec![work(utc(3, 14, 9)), interrupted(utc(3, 14, 10))];
        let report = FocusStats::new(&sessions, now()).report();
        assert_eq!(report.total_completed, 1);
        assert_eq!(report.completion_rate, 0.5);
        assert_eq!(report.streak_days, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["today"]["completed_pomodoros"], 1);
        assert_eq!(json["weekly_trend"].as_array().unwrap().len(), 7);
        assert_eq!(json["hourly_distribution"].as_array().unwrap().len(), 24);
    }
}
