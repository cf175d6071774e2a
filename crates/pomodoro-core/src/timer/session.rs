use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of interval being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionType {
    Work,
    Break,
}

impl SessionType {
    /// The session that follows this one after a natural completion.
    pub fn next(self) -> Self {
        match self {
            SessionType::Work => SessionType::Break,
            SessionType::Break => SessionType::Work,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::Break => "break",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" | "focus" => Ok(SessionType::Work),
            "break" => Ok(SessionType::Break),
            other => Err(ValidationError::invalid(
                "session_type",
                format!("expected 'work' or 'break', got '{other}'"),
            )),
        }
    }
}

/// User-facing timer preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_duration")]
    pub work_duration_minutes: u32,
    #[serde(default = "default_break_duration")]
    pub break_duration_minutes: u32,
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    #[serde(default = "default_true")]
    pub enable_vibration: bool,
    #[serde(default = "default_true")]
    pub enable_sound: bool,
}

fn default_work_duration() -> u32 {
    25
}
fn default_break_duration() -> u32 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_duration_minutes: default_work_duration(),
            break_duration_minutes: default_break_duration(),
            enable_notifications: true,
            enable_vibration: true,
            enable_sound: true,
        }
    }
}

impl TimerSettings {
    /// Configured duration for a session type, in minutes.
    pub fn duration_min(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Work => self.work_duration_minutes,
            SessionType::Break => self.break_duration_minutes,
        }
    }

    /// Configured duration for a session type, in seconds.
    pub fn duration_secs(&self, session_type: SessionType) -> u64 {
        u64::from(self.duration_min(session_type)).saturating_mul(60)
    }

    /// # Errors
    /// Returns an error if either duration is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_duration_minutes == 0 {
            return Err(ValidationError::invalid(
                "work_duration_minutes",
                "must be at least 1 minute",
            ));
        }
        if self.break_duration_minutes == 0 {
            return Err(ValidationError::invalid(
                "break_duration_minutes",
                "must be at least 1 minute",
            ));
        }
        Ok(())
    }
}
