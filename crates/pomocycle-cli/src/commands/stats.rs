use chrono::{Duration, Local, NaiveDate};
use clap::Subcommand;
use pomocycle_core::storage::Database;
use pomocycle_core::{CoreError, FocusStats, SessionStore};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Current and longest daily streak
    Streak,
    /// Completed pomodoros per hour of day
    Hours,
    /// Completed pomodoros per weekday over the last seven days
    Week,
    /// Totals between two local dates, inclusive (defaults to the last seven days)
    Range {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Session history for one task
    Task {
        /// Task identifier
        task_id: String,
    },
    /// Everything at once
    Report,
}

pub fn run(action: StatsAction) -> Result<(), CoreError> {
    let db = Database::open()?;
    let sessions = db.query_all()?;
    let now = Local::now();
    let stats = FocusStats::new(&sessions, now);

    let output = match action {
        StatsAction::Today => serde_json::to_value(stats.daily_summary(now.date_naive()))?,
        StatsAction::All => serde_json::json!({
            "total_completed": stats.total_completed(),
            "total_focus_secs": stats.total_focus_time(),
            "completion_rate": stats.completion_rate(),
        }),
        StatsAction::Streak => serde_json::json!({
            "streak_days": stats.streak_days(),
            "longest_streak": stats.longest_streak(),
        }),
        StatsAction::Hours => serde_json::json!({
            "hourly_distribution": stats.hourly_distribution(),
            "best_working_hour": stats.best_working_hour(),
        }),
        StatsAction::Week => serde_json::json!({
            "weekly_trend": stats.weekly_trend(),
        }),
        StatsAction::Range { from, to } => {
            let to = to.unwrap_or_else(|| now.date_naive());
            let from = from.unwrap_or(to - Duration::days(6));
            serde_json::to_value(stats.range_summary(from, to))?
        }
        StatsAction::Task { task_id } => {
            let history = stats.sessions_for_task(&task_id);
            let completed = history.iter().filter(|s| s.is_completed_work()).count();
            serde_json::json!({
                "task_id": task_id,
                "completed_pomodoros": completed,
                "sessions": history,
            })
        }
        StatsAction::Report => serde_json::to_value(stats.report())?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
