//! Metrics Calculator — reduces one actor's day of execution records into
//! four normalized scalars.

use crate::config::Thresholds;
use crate::error::Result;
use crate::store::LogStore;
use crate::types::{validate_all, ExecutionRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Neutral time deviation reported when no record carries timing data.
pub const NEUTRAL_TIME_DEVIATION: f64 = 1.0;

// ---------------------------------------------------------------------------
// DailyMetrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub total_steps: usize,
    pub completed_steps: usize,
    /// completed / total, 0.0 on an empty day.
    pub execution_accuracy: f64,
    /// Mean actual/planned duration ratio; 1.0 when nothing qualifies.
    pub time_deviation: f64,
    /// Mean of reported quality scores; 0.0 when none reported.
    pub quality_compliance: f64,
    /// Completed with quality at or above the bar, over total.
    pub process_efficiency: f64,
}

impl DailyMetrics {
    pub fn empty() -> Self {
        Self {
            total_steps: 0,
            completed_steps: 0,
            execution_accuracy: 0.0,
            time_deviation: NEUTRAL_TIME_DEVIATION,
            quality_compliance: 0.0,
            process_efficiency: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Actual over planned duration for a record that has actual start, actual
/// end, and planned start. Records with an inverted time span or a
/// non-positive plan do not qualify.
fn duration_ratio(record: &ExecutionRecord, thresholds: &Thresholds) -> Option<f64> {
    record.planned_start?;
    let actual = record.elapsed_minutes()?;
    let planned = record
        .planned_duration_minutes
        .unwrap_or(thresholds.default_planned_minutes);
    if planned <= 0.0 {
        return None;
    }
    Some(actual / planned)
}

/// Pure reduction over an already-fetched record set.
pub fn compute(records: &[ExecutionRecord], thresholds: &Thresholds) -> DailyMetrics {
    if records.is_empty() {
        return DailyMetrics::empty();
    }

    let total_steps = records.len();
    let completed_steps = records.iter().filter(|r| r.is_completed()).count();

    let ratios: Vec<f64> = records
        .iter()
        .filter_map(|r| duration_ratio(r, thresholds))
        .collect();
    let scores: Vec<f64> = records.iter().filter_map(|r| r.quality_score).collect();

    let efficient = records
        .iter()
        .filter(|r| {
            r.is_completed()
                && r
                    .quality_score
                    .is_some_and(|q| q >= thresholds.efficiency_quality_bar)
        })
        .count();

    DailyMetrics {
        total_steps,
        completed_steps,
        execution_accuracy: ratio(completed_steps, total_steps),
        time_deviation: mean(&ratios).unwrap_or(NEUTRAL_TIME_DEVIATION),
        quality_compliance: mean(&scores).unwrap_or(0.0),
        process_efficiency: ratio(efficient, total_steps),
    }
}

/// Fetch the (actor, date) snapshot and compute its metrics. Store failures
/// and malformed records fail the whole calculation.
pub fn calculate(
    store: &dyn LogStore,
    thresholds: &Thresholds,
    actor_id: &str,
    date: NaiveDate,
) -> Result<DailyMetrics> {
    let records = store.fetch_records(actor_id, date)?;
    validate_all(&records)?;
    let metrics = compute(&records, thresholds);
    debug!(
        actor = actor_id,
        %date,
        total = metrics.total_steps,
        completed = metrics.completed_steps,
        "computed daily metrics"
    );
    Ok(metrics)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
