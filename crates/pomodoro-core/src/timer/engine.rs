//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use internal
//! threads or read the system timer: the caller delivers one `tick()` per
//! second (see [`TickSource`](super::TickSource)), which keeps the countdown
//! deterministic under test.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --start/pause--> Paused --start/resume--> Running
//! Running --tick (remaining == 0)--> Completed --(immediately)--> Idle (next type)
//! Running | Paused --cancel--> Idle (same type)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start();
//! // Once per second:
//! if let Some(event) = engine.tick() { /* render, persist event.record() */ }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::session::{SessionType, TimerSettings};
use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::SessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Transient: set while the finished session is recorded, then replaced by
    /// `Idle` on the next session before control returns to the caller.
    Completed,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "completed",
        }
    }
}

fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    settings: TimerSettings,
    state: TimerState,
    session_type: SessionType,
    total_secs: u64,
    remaining_secs: u64,
    /// Wall-clock time of the first start of the current countdown.
    #[serde(default)]
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip, default = "system_clock")]
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    /// Create an idle engine on a work session of the configured length.
    pub fn new(settings: TimerSettings) -> Self {
        Self::with_clock(settings, system_clock())
    }

    pub fn with_clock(settings: TimerSettings, clock: Arc<dyn Clock>) -> Self {
        let total_secs = settings.duration_secs(SessionType::Work);
        Self {
            settings,
            state: TimerState::Idle,
            session_type: SessionType::Work,
            total_secs,
            remaining_secs: total_secs,
            started_at: None,
            clock,
        }
    }

    /// Replace the clock, e.g. after deserializing a persisted engine.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.remaining_secs)
    }

    /// 0.0 ..= 1.0 progress within the current countdown.
    pub fn progress(&self) -> f64 {
        countdown_progress(self.total_secs, self.remaining_secs)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            session_type: self.session_type,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            progress: self.progress(),
            display: format_time(self.remaining_secs),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start, or toggle between running and paused.
    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                self.started_at = Some(self.clock.now());
                if self.remaining_secs == 0 {
                    return Some(self.finish());
                }
                Some(Event::TimerStarted {
                    session_type: self.session_type,
                    duration_secs: self.total_secs,
                    at: self.clock.now(),
                })
            }
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
            TimerState::Completed => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        Some(Event::TimerResumed {
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Advance the countdown by one second. Ignored unless running.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.finish());
        }
        Some(Event::TimerTicked {
            remaining_secs: self.remaining_secs,
            progress: self.progress(),
        })
    }

    /// Stop a running or paused countdown and record the elapsed part.
    pub fn cancel(&mut self) -> Option<Event> {
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return None;
        }
        let elapsed_min = minutes_floor(self.elapsed_secs());
        let record = self.record(elapsed_min, false);
        let at = self.clock.now();
        self.seed(self.session_type);
        Some(Event::SessionCancelled { record, at })
    }

    /// Discard any countdown and go idle with `minutes` on the clock.
    ///
    /// # Errors
    /// Rejects negative minutes without touching state.
    pub fn set_custom_time(&mut self, minutes: i64) -> Result<Event, ValidationError> {
        let minutes = u64::try_from(minutes)
            .map_err(|_| ValidationError::invalid("minutes", "must not be negative"))?;
        let secs = minutes.saturating_mul(60);
        self.state = TimerState::Idle;
        self.total_secs = secs;
        self.remaining_secs = secs;
        self.started_at = None;
        Ok(self.duration_changed())
    }

    /// Switch to the configured duration of `session_type`.
    ///
    /// # Errors
    /// Only allowed while idle.
    pub fn set_session_type(&mut self, session_type: SessionType) -> Result<Event, ValidationError> {
        if self.state != TimerState::Idle {
            return Err(ValidationError::InvalidState {
                action: "change session type".into(),
                state: self.state.as_str().into(),
            });
        }
        self.seed(session_type);
        Ok(self.duration_changed())
    }

    /// Store new settings; an idle timer picks up the new duration at once.
    ///
    /// # Errors
    /// Rejects invalid settings without touching state.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Result<Option<Event>, ValidationError> {
        settings.validate()?;
        self.settings = settings;
        if self.state != TimerState::Idle {
            return Ok(None);
        }
        self.seed(self.session_type);
        Ok(Some(self.duration_changed()))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self) -> Event {
        self.state = TimerState::Completed;
        self.remaining_secs = 0;
        let finished = self.session_type;
        let planned_min = minutes_floor(self.total_secs);
        let record = (planned_min > 0).then(|| self.record(planned_min, true));
        let at = self.clock.now();

        let next = finished.next();
        self.seed(next);
        Event::SessionCompleted {
            session_type: finished,
            record,
            next_session_type: next,
            next_duration_secs: self.total_secs,
            at,
        }
    }

    fn record(&self, actual_min: u32, completed: bool) -> SessionRecord {
        let planned_min = minutes_floor(self.total_secs);
        SessionRecord::new(
            self.session_type,
            planned_min,
            actual_min.min(planned_min),
            completed,
            self.started_at,
            Some(self.clock.now()),
        )
    }

    fn seed(&mut self, session_type: SessionType) {
        self.session_type = session_type;
        self.total_secs = self.settings.duration_secs(session_type);
        self.remaining_secs = self.total_secs;
        self.started_at = None;
        self.state = TimerState::Idle;
    }

    fn duration_changed(&self) -> Event {
        Event::DurationChanged {
            session_type: self.session_type,
            total_secs: self.total_secs,
            at: self.clock.now(),
        }
    }
}

fn minutes_floor(secs: u64) -> u32 {
    u32::try_from(secs / 60).unwrap_or(u32::MAX)
}

/// `1 - remaining / total`, clamped to 0.0 ..= 1.0. A zero-length countdown
/// reports 0.0 since it completes before any progress is shown.
pub fn countdown_progress(total_secs: u64, remaining_secs: u64) -> f64 {
    if total_secs == 0 {
        return 0.0;
    }
    (1.0 - remaining_secs as f64 / total_secs as f64).clamp(0.0, 1.0)
}

/// Render seconds as `MM:SS`.
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
