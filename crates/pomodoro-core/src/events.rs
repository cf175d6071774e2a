use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;
use crate::sync::SaveOutcome;
use crate::timer::{SessionType, TimerState};

/// Every state change in the timer produces an Event.
/// Front-ends render them; the runner persists the records they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        remaining_secs: u64,
        progress: f64,
    },
    /// The countdown reached zero. The engine is already idle on the next
    /// session when this is emitted. Zero-length countdowns carry no record.
    SessionCompleted {
        session_type: SessionType,
        record: Option<SessionRecord>,
        next_session_type: SessionType,
        next_duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The user stopped a running or paused countdown.
    SessionCancelled {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    /// Total duration changed while idle (custom time, session type, settings).
    DurationChanged {
        session_type: SessionType,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        session_type: SessionType,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        display: String,
        at: DateTime<Utc>,
    },
    /// A finished session reached local storage.
    SessionSaved {
        outcome: SaveOutcome,
    },
    /// A finished session could not be stored locally.
    SessionSaveFailed {
        id: String,
        error: String,
    },
}

impl Event {
    /// The record a terminal timer event carries, if any.
    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            Event::SessionCompleted { record, .. } => record.as_ref(),
            Event::SessionCancelled { record, .. } => Some(record),
            _ => None,
        }
    }
}
