//! Persisted record of one finished work or break interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::timer::SessionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub planned_duration_minutes: u32,
    pub actual_duration_minutes: u32,
    pub completed: bool,
    pub session_type: SessionType,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl SessionRecord {
    /// Build a record with a freshly minted id.
    ///
    /// The id is assigned here, once, and is reused verbatim by both the
    /// local and the remote layer.
    pub fn new(
        session_type: SessionType,
        planned_duration_minutes: u32,
        actual_duration_minutes: u32,
        completed: bool,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: new_session_id(),
            planned_duration_minutes,
            actual_duration_minutes,
            completed,
            session_type,
            started_at,
            ended_at,
            owner_id: None,
        }
    }

    /// Sort key used for history ordering. Missing start times sort as epoch.
    pub fn started_at_ms(&self) -> i64 {
        self.started_at.map(|t| t.timestamp_millis()).unwrap_or(0)
    }

    /// # Errors
    /// Returns an error if the record breaks a data-model invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::invalid("id", "must not be empty"));
        }
        if self.planned_duration_minutes == 0 {
            return Err(ValidationError::invalid(
                "planned_duration_minutes",
                "must be at least 1 minute",
            ));
        }
        if self.actual_duration_minutes > self.planned_duration_minutes {
            return Err(ValidationError::invalid(
                "actual_duration_minutes",
                format!(
                    "{} exceeds planned duration {}",
                    self.actual_duration_minutes, self.planned_duration_minutes
                ),
            ));
        }
        if let (Some(start), Some(end)) = (self.started_at, self.ended_at) {
            if end < start {
                return Err(ValidationError::InvalidTimeRange { start, end });
            }
        }
        Ok(())
    }
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Sort newest first; records without a start time go last.
pub fn sort_newest_first(records: &mut [SessionRecord]) {
    records.sort_by(|a, b| {
        b.started_at_ms()
            .cmp(&a.started_at_ms())
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> SessionRecord {
        let start = Utc::now();
        SessionRecord::new(
            SessionType::Work,
            25,
            25,
            true,
            Some(start),
            Some(start + Duration::minutes(25)),
        )
    }

    #[test]
    fn new_records_get_unique_ids() {
        assert_ne!(record().id, record().id);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("plannedDurationMinutes").is_some());
        assert!(json.get("actualDurationMinutes").is_some());
        assert_eq!(json["sessionType"], "WORK");
        assert!(json["ownerId"].is_null());
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let rec: SessionRecord = serde_json::from_str(
            r#"{"id":"x","plannedDurationMinutes":5,"actualDurationMinutes":2,
                "completed":false,"sessionType":"BREAK"}"#,
        )
        .unwrap();
        assert_eq!(rec.started_at, None);
        assert_eq!(rec.owner_id, None);
        assert_eq!(rec.started_at_ms(), 0);
    }

    #[test]
    fn validate_rejects_overlong_actual() {
        let mut rec = record();
        rec.actual_duration_minutes = 30;
        assert!(rec.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_time_range() {
        let mut rec = record();
        rec.ended_at = rec.started_at.map(|s| s - Duration::minutes(1));
        assert!(matches!(
            rec.validate(),
            Err(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn sort_puts_missing_start_last() {
        let now = Utc::now();
        let mut older = record();
        older.started_at = Some(now - Duration::hours(2));
        let mut newer = record();
        newer.started_at = Some(now);
        let mut undated = record();
        undated.started_at = None;

        let mut list = vec![undated.clone(), older.clone(), newer.clone()];
        sort_newest_first(&mut list);
        assert_eq!(list[0].id, newer.id);
        assert_eq!(list[1].id, older.id);
        assert_eq!(list[2].id, undated.id);
    }
}
