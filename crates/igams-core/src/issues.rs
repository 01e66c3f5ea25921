//! Issue Detector — discrete anomalies per execution record.

use crate::config::Thresholds;
use crate::error::Result;
use crate::store::LogStore;
use crate::types::{validate_all, ExecutionRecord, ExecutionStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LowQuality,
    TimeOverrun,
    Skipped,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::LowQuality => "low_quality",
            IssueKind::TimeOverrun => "time_overrun",
            IssueKind::Skipped => "skipped",
        }
    }

    /// Whether the issue counts as an execution error in an inspection.
    pub fn is_error(self) -> bool {
        matches!(self, IssueKind::LowQuality | IssueKind::Skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub record_id: String,
    pub step_id: String,
    /// Reported quality, for `low_quality`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Elapsed minutes, for `time_overrun`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    pub description: String,
}

impl Issue {
    fn new(kind: IssueKind, record: &ExecutionRecord, description: &str) -> Self {
        Self {
            kind,
            record_id: record.id.clone(),
            step_id: record.step_id.clone(),
            score: None,
            duration_minutes: None,
            description: description.to_string(),
        }
    }
}

fn detect_record(record: &ExecutionRecord, thresholds: &Thresholds, out: &mut Vec<Issue>) {
    if let Some(score) = record.quality_score {
        if score < thresholds.low_quality_score {
            out.push(Issue {
                score: Some(score),
                ..Issue::new(
                    IssueKind::LowQuality,
                    record,
                    "Quality score below the acceptable threshold",
                )
            });
        }
    }

    if let Some(minutes) = record.elapsed_minutes() {
        if minutes > thresholds.overrun_minutes {
            out.push(Issue {
                duration_minutes: Some(minutes),
                ..Issue::new(
                    IssueKind::TimeOverrun,
                    record,
                    "Step took considerably longer than a typical step",
                )
            });
        }
    }

    if record.status == ExecutionStatus::Skipped {
        out.push(Issue::new(
            IssueKind::Skipped,
            record,
            "Step was skipped; the step may not fit the process as designed",
        ));
    }
}

/// Scan records in store order; a record may emit several issues, in the
/// order low quality, time overrun, skipped.
pub fn detect(records: &[ExecutionRecord], thresholds: &Thresholds) -> Vec<Issue> {
    let mut issues = Vec::new();
    for record in records {
        detect_record(record, thresholds, &mut issues);
    }
    issues
}

/// Fetch the (actor, date) snapshot and detect its issues.
pub fn detect_for_day(
    store: &dyn LogStore,
    thresholds: &Thresholds,
    actor_id: &str,
    date: NaiveDate,
) -> Result<Vec<Issue>> {
    let records = store.fetch_records(actor_id, date)?;
    validate_all(&records)?;
    let issues = detect(&records, thresholds);
    debug!(actor = actor_id, %date, count = issues.len(), "detected issues");
    Ok(issues)
}

pub fn count_kind(issues: &[Issue], kind: IssueKind) -> usize {
    issues.iter().filter(|i| i.kind == kind).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
