use crate::error::{ControlError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ExecutionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
    Blocked,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::InProgress => "in_progress",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Skipped => "skipped",
            ExecutionStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ExecutionStatus::Pending),
            "in_progress" => Some(ExecutionStatus::InProgress),
            "completed" => Some(ExecutionStatus::Completed),
            "skipped" => Some(ExecutionStatus::Skipped),
            "blocked" => Some(ExecutionStatus::Blocked),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Deviation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationKind {
    Time,
    Quality,
    Process,
    Skip,
    External,
}

impl DeviationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviationKind::Time => "time",
            DeviationKind::Quality => "quality",
            DeviationKind::Process => "process",
            DeviationKind::Skip => "skip",
            DeviationKind::External => "external",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "time" => Some(DeviationKind::Time),
            "quality" => Some(DeviationKind::Quality),
            "process" => Some(DeviationKind::Process),
            "skip" => Some(DeviationKind::Skip),
            "external" => Some(DeviationKind::External),
            _ => None,
        }
    }
}

/// A recorded divergence from plan. Owned by its [`ExecutionRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub kind: DeviationKind,
    pub description: String,
    /// 0.0 (minor) to 1.0 (critical).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
}

// ---------------------------------------------------------------------------
// ExecutionRecord
// ---------------------------------------------------------------------------

/// One step's execution attempt for one actor on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub step_id: String,
    pub actor_id: String,
    pub execution_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<DateTime<Utc>>,
    /// Explicit plan length for the step. When absent the configured
    /// default planned duration applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration_minutes: Option<f64>,
    pub status: ExecutionStatus,
    /// Self-reported quality in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deviations: Vec<Deviation>,
}

impl ExecutionRecord {
    pub fn new(
        id: impl Into<String>,
        step_id: impl Into<String>,
        actor_id: impl Into<String>,
        execution_date: NaiveDate,
        status: ExecutionStatus,
    ) -> Self {
        Self {
            id: id.into(),
            step_id: step_id.into(),
            actor_id: actor_id.into(),
            execution_date,
            planned_start: None,
            actual_start: None,
            actual_end: None,
            planned_duration_minutes: None,
            status,
            quality_score: None,
            notes: None,
            deviations: Vec::new(),
        }
    }

    /// Minutes between actual start and actual end.
    ///
    /// `None` when either timestamp is missing or when the end precedes the
    /// start; such records never contribute to time signals.
    pub fn elapsed_minutes(&self) -> Option<f64> {
        let (start, end) = (self.actual_start?, self.actual_end?);
        let seconds = (end - start).num_milliseconds() as f64 / 1000.0;
        if seconds < 0.0 {
            return None;
        }
        Some(seconds / 60.0)
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    /// Reject records whose self-reported scores fall outside [0, 1].
    ///
    /// An end timestamp before the start timestamp is tolerated here.
    pub fn validate(&self) -> Result<()> {
        if let Some(q) = self.quality_score {
            if !(0.0..=1.0).contains(&q) {
                return Err(ControlError::malformed(
                    &self.id,
                    format!("quality score {q} is outside [0, 1]"),
                ));
            }
        }
        if let Some(minutes) = self.planned_duration_minutes {
            if !minutes.is_finite() {
                return Err(ControlError::malformed(
                    &self.id,
                    "planned duration is not a finite number",
                ));
            }
        }
        for deviation in &self.deviations {
            if let Some(impact) = deviation.impact_level {
                if !(0.0..=1.0).contains(&impact) {
                    return Err(ControlError::malformed(
                        &self.id,
                        format!(
                            "{} deviation impact {impact} is outside [0, 1]",
                            deviation.kind.as_str()
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Validate every record of a snapshot; the first malformed record fails the set.
pub fn validate_all(records: &[ExecutionRecord]) -> Result<()> {
    records.iter().try_for_each(ExecutionRecord::validate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[test]
    fn elapsed_minutes_requires_both_timestamps() {
        let mut rec = ExecutionRecord::new("r1", "s1", "a1", day(), ExecutionStatus::Completed);
        assert_eq!(rec.elapsed_minutes(), None);
        rec.actual_start = Some(at(9, 0));
        assert_eq!(rec.elapsed_minutes(), None);
        rec.actual_end = Some(at(10, 30));
        assert_eq!(rec.elapsed_minutes(), Some(90.0));
    }

    #[test]
    fn elapsed_minutes_is_none_when_end_precedes_start() {
        let mut rec = ExecutionRecord::new("r1", "s1", "a1", day(), ExecutionStatus::Completed);
        rec.actual_start = Some(at(11, 0));
        rec.actual_end = Some(at(10, 0));
        assert_eq!(rec.elapsed_minutes(), None);
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let mut rec = ExecutionRecord::new("r9", "s1", "a1", day(), ExecutionStatus::Completed);
        rec.quality_score = Some(1.2);
        let err = rec.validate().unwrap_err();
        assert!(matches!(err, ControlError::MalformedRecord { ref id, .. } if id == "r9"));

        rec.quality_score = Some(f64::NAN);
        assert!(rec.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_deviation_impact() {
        let mut rec = ExecutionRecord::new("r2", "s1", "a1", day(), ExecutionStatus::Skipped);
        rec.deviations.push(Deviation {
            kind: DeviationKind::External,
            description: "power outage".to_string(),
            impact_level: Some(-0.1),
            root_cause: None,
        });
        assert!(rec.validate().is_err());
    }

    #[test]
    fn status_strings_match_serde_names() {
        for status in [
            ExecutionStatus::Pending,
            ExecutionStatus::InProgress,
            ExecutionStatus::Completed,
            ExecutionStatus::Skipped,
            ExecutionStatus::Blocked,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(ExecutionStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn record_json_omits_absent_fields() {
        let rec = ExecutionRecord::new("r1", "s1", "a1", day(), ExecutionStatus::Pending);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["execution_date"], "2026-03-02");
        assert_eq!(json["status"], "pending");
        assert!(json.get("quality_score").is_none());
        assert!(json.get("deviations").is_none());
    }
}
