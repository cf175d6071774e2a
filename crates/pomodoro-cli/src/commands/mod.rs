pub mod auth;
pub mod config;
pub mod sessions;
pub mod settings;
pub mod stats;
pub mod timer;

use std::sync::Arc;

use pomodoro_core::{Config, Database, SessionStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Handles shared by commands that touch local data.
pub struct Context {
    pub db: Arc<Database>,
    pub store: Arc<SessionStore>,
}

impl Context {
    pub fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open_at(&config.database_path()?)?);
        let store = SessionStore::from_config(config, db.clone())?;
        Ok(Self {
            db,
            store: Arc::new(store),
        })
    }

    /// Signed-in owner, if any.
    pub fn owner(&self) -> Option<String> {
        self.store.current_owner()
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
