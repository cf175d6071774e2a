mod config;
pub mod database;
pub mod local;
pub mod record;
mod settings;

pub use config::{Config, LoggingConfig, RemoteConfig, StorageConfig};
pub use database::Database;
pub use local::{LocalStore, MemoryLocalStore};
pub use record::{new_session_id, sort_newest_first, SessionRecord};
pub use settings::{MemorySettings, SettingsStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// - `POMODORO_HOME` set: that directory, as-is.
/// - `POMODORO_ENV=dev`: `~/.config/pomodoro-dev/`.
/// - otherwise: `~/.config/pomodoro/`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMODORO_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMODORO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomodoro-dev")
            } else {
                base_dir.join("pomodoro")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
