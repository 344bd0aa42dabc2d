mod config;
pub mod database;
pub mod migrations;
mod store;

pub use config::{AutomationConfig, Config, NotificationsConfig, ScheduleConfig};
pub use database::Database;
pub use store::{MemorySessionStore, RetryPolicy, RetryingStore, SessionStore};

use std::path::PathBuf;

/// Returns the data directory.
///
/// `POMOCYCLE_DATA_DIR` overrides the location outright. Otherwise it is
/// `~/.config/pomocycle[-dev]/`, where POMOCYCLE_ENV=dev selects the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("POMOCYCLE_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOCYCLE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomocycle-dev")
            } else {
                base_dir.join("pomocycle")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
