//! Timer settings persisted as five scalar key-value entries.

use std::sync::Mutex;

use super::database::Database;
use crate::error::{CoreError, StorageError};
use crate::timer::TimerSettings;

const WORK_DURATION_KEY: &str = "work_duration";
const BREAK_DURATION_KEY: &str = "break_duration";
const NOTIFICATIONS_KEY: &str = "notifications";
const VIBRATION_KEY: &str = "vibration";
const SOUND_KEY: &str = "sound";

pub trait SettingsStore: Send + Sync {
    /// Current settings; missing or unparsable entries fall back to defaults.
    fn get(&self) -> TimerSettings;

    /// Validate and persist new settings.
    fn set(&self, settings: &TimerSettings) -> Result<(), CoreError>;
}

impl Database {
    fn kv_parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.kv_get(key) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = %raw, "ignoring unparsable setting");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read setting");
                default
            }
        }
    }
}

impl SettingsStore for Database {
    fn get(&self) -> TimerSettings {
        let defaults = TimerSettings::default();
        let settings = TimerSettings {
            work_duration_minutes: self.kv_parse(WORK_DURATION_KEY, defaults.work_duration_minutes),
            break_duration_minutes: self
                .kv_parse(BREAK_DURATION_KEY, defaults.break_duration_minutes),
            enable_notifications: self.kv_parse(NOTIFICATIONS_KEY, defaults.enable_notifications),
            enable_vibration: self.kv_parse(VIBRATION_KEY, defaults.enable_vibration),
            enable_sound: self.kv_parse(SOUND_KEY, defaults.enable_sound),
        };
        // A hand-edited zero would wedge the engine.
        if settings.validate().is_err() {
            return defaults;
        }
        settings
    }

    fn set(&self, settings: &TimerSettings) -> Result<(), CoreError> {
        settings.validate()?;
        let entries = [
            (WORK_DURATION_KEY, settings.work_duration_minutes.to_string()),
            (BREAK_DURATION_KEY, settings.break_duration_minutes.to_string()),
            (NOTIFICATIONS_KEY, settings.enable_notifications.to_string()),
            (VIBRATION_KEY, settings.enable_vibration.to_string()),
            (SOUND_KEY, settings.enable_sound.to_string()),
        ];
        self.kv_set_many(&entries)?;
        Ok(())
    }
}

/// Settings held in memory only.
#[derive(Default)]
pub struct MemorySettings {
    inner: Mutex<TimerSettings>,
}

impl MemorySettings {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self) -> TimerSettings {
        self.inner
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn set(&self, settings: &TimerSettings) -> Result<(), CoreError> {
        settings.validate()?;
        let mut guard = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
        *guard = settings.clone();
        Ok(())
    }
}
