//! Daily analysis pipeline: one fetch, then metrics and issues over the same
//! snapshot, then suggestions, then (optionally) advisory text.

use crate::advisory::{consult, Advisory, AdvisoryBridge, AdvisoryRequest};
use crate::config::Config;
use crate::engine::{EvalContext, ImprovementSuggestion, RecommendationEngine};
use crate::error::{ControlError, Result};
use crate::issues::{self, Issue};
use crate::metrics::{self, DailyMetrics};
use crate::store::LogStore;
use crate::types::{validate_all, ExecutionRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAnalysis {
    pub actor_id: String,
    pub date: NaiveDate,
    pub metrics: DailyMetrics,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<ImprovementSuggestion>,
    /// Ids of the rules that fired, in rule order.
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisedAnalysis {
    #[serde(flatten)]
    pub analysis: DailyAnalysis,
    pub advisory: Advisory,
}

/// Point-in-time quality inspection of one day. Computed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub actor_id: String,
    pub date: NaiveDate,
    pub quality_score: f64,
    pub compliance_score: f64,
    pub findings: Vec<Issue>,
    pub errors_detected: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMetrics {
    pub date: NaiveDate,
    pub metrics: DailyMetrics,
}

// ---------------------------------------------------------------------------
// Pure pipeline
// ---------------------------------------------------------------------------

/// Analyze an already-fetched, validated snapshot.
pub fn analyze_records(
    records: &[ExecutionRecord],
    config: &Config,
    actor_id: &str,
    date: NaiveDate,
) -> DailyAnalysis {
    let thresholds = &config.thresholds;
    let metrics = metrics::compute(records, thresholds);
    let issues = issues::detect(records, thresholds);

    let engine = RecommendationEngine::default();
    let ctx = EvalContext {
        metrics: &metrics,
        issues: &issues,
        thresholds,
    };
    let suggestions = engine.recommend(&ctx);
    let signals = suggestions.iter().map(|s| s.rule.clone()).collect();

    DailyAnalysis {
        actor_id: actor_id.to_string(),
        date,
        metrics,
        issues,
        suggestions,
        signals,
    }
}

// ---------------------------------------------------------------------------
// Store-backed operations
// ---------------------------------------------------------------------------

fn fetch_day(store: &dyn LogStore, actor_id: &str, date: NaiveDate) -> Result<Vec<ExecutionRecord>> {
    let records = store.fetch_records(actor_id, date)?;
    validate_all(&records)?;
    Ok(records)
}

pub fn analyze_day(
    store: &dyn LogStore,
    config: &Config,
    actor_id: &str,
    date: NaiveDate,
) -> Result<DailyAnalysis> {
    let records = fetch_day(store, actor_id, date)?;
    let analysis = analyze_records(&records, config, actor_id, date);
    debug!(
        actor = actor_id,
        %date,
        issues = analysis.issues.len(),
        suggestions = analysis.suggestions.len(),
        "analyzed day"
    );
    Ok(analysis)
}

pub fn inspect_day(
    store: &dyn LogStore,
    config: &Config,
    actor_id: &str,
    date: NaiveDate,
) -> Result<Inspection> {
    let records = fetch_day(store, actor_id, date)?;
    let metrics = metrics::compute(&records, &config.thresholds);
    let findings = issues::detect(&records, &config.thresholds);
    let errors_detected = findings
        .iter()
        .filter(|i| i.kind.is_error())
        .cloned()
        .collect();
    Ok(Inspection {
        actor_id: actor_id.to_string(),
        date,
        quality_score: metrics.quality_compliance,
        compliance_score: metrics.execution_accuracy,
        findings,
        errors_detected,
    })
}

/// Reject reversed ranges and spans longer than the configured maximum.
pub fn check_range(config: &Config, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(ControlError::InvalidRange {
            start,
            end,
            reason: "start is after end".to_string(),
        });
    }
    let days = (end - start).num_days() + 1;
    let max = i64::from(config.analysis.max_range_days);
    if days > max {
        return Err(ControlError::InvalidRange {
            start,
            end,
            reason: format!("spans {days} days, maximum is {max}"),
        });
    }
    Ok(())
}

/// One entry per calendar day of the inclusive range; days without records
/// carry the empty-day defaults.
pub fn metrics_range(
    store: &dyn LogStore,
    config: &Config,
    actor_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DayMetrics>> {
    check_range(config, start, end)?;
    let records = store.fetch_records_range(actor_id, start, end)?;
    validate_all(&records)?;

    let mut by_day: BTreeMap<NaiveDate, Vec<ExecutionRecord>> = BTreeMap::new();
    for record in records {
        by_day.entry(record.execution_date).or_default().push(record);
    }

    Ok(start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| DayMetrics {
            date,
            metrics: by_day
                .get(&date)
                .map(|day| metrics::compute(day, &config.thresholds))
                .unwrap_or_else(DailyMetrics::empty),
        })
        .collect())
}

/// Attach advisory text. The structured analysis is returned unchanged
/// whatever the bridge does.
pub fn advise(analysis: DailyAnalysis, bridge: &dyn AdvisoryBridge) -> AdvisedAnalysis {
    let request = AdvisoryRequest {
        metrics: analysis.metrics,
        issues: analysis.issues.clone(),
        signals: analysis.signals.clone(),
    };
    let advisory = consult(bridge, &request);
    AdvisedAnalysis { analysis, advisory }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
