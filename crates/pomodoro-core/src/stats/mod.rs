//! Aggregate statistics over a set of session records.
//!
//! Statistics are derived from the current record set and never stored.

use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;

/// Summary shown on the history screen.
///
/// Every session counts, whatever its type or completion state:
/// `total_work_time` is the sum of actual minutes over all records and
/// `average_session_length` divides it by the record count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    /// Minutes.
    pub total_work_time: u64,
    pub average_session_length: f64,
    /// Percent, 0.0 ..= 100.0.
    pub completion_rate: f64,
}

impl SessionStats {
    pub fn from_sessions(sessions: &[SessionRecord]) -> Self {
        let total_sessions = sessions.len() as u64;
        let completed_sessions = sessions.iter().filter(|s| s.completed).count() as u64;
        let total_work_time: u64 = sessions
            .iter()
            .map(|s| u64::from(s.actual_duration_minutes))
            .sum();

        let (average_session_length, completion_rate) = if total_sessions == 0 {
            (0.0, 0.0)
        } else {
            (
                total_work_time as f64 / total_sessions as f64,
                completed_sessions as f64 / total_sessions as f64 * 100.0,
            )
        };

        Self {
            total_sessions,
            completed_sessions,
            total_work_time,
            average_session_length,
            completion_rate,
        }
    }
}

/// Totals computed over the remote copy only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub failed_sessions: u64,
    /// Minutes.
    pub total_duration: u64,
}

impl RemoteStats {
    pub fn from_sessions(sessions: &[SessionRecord]) -> Self {
        let total_sessions = sessions.len() as u64;
        let completed_sessions = sessions.iter().filter(|s| s.completed).count() as u64;
        Self {
            total_sessions,
            completed_sessions,
            failed_sessions: total_sessions - completed_sessions,
            total_duration: sessions
                .iter()
                .map(|s| u64::from(s.actual_duration_minutes))
                .sum(),
        }
    }
}
