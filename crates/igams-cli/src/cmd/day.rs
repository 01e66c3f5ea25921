use crate::context::Context;
use crate::output::{opt_number, percent, print_json, print_table};
use chrono::NaiveDate;
use igams_core::advisory::{bridge_from_config, Advisory};
use igams_core::analysis;
use igams_core::engine::ImprovementSuggestion;
use igams_core::issues::{self, Issue};
use igams_core::metrics::{self, DailyMetrics};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// metrics
// ---------------------------------------------------------------------------

pub fn run_metrics(ctx: &Context, date: NaiveDate, json: bool) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let store = ctx.open_store()?;
    let m = metrics::calculate(&store, &ctx.config.thresholds, actor, date)?;

    if json {
        return print_json(&serde_json::json!({
            "actor_id": actor,
            "date": date,
            "metrics": m,
        }));
    }

    println!("Metrics for {actor} on {date}");
    print_metrics(&m);
    Ok(())
}

pub(crate) fn print_metrics(m: &DailyMetrics) {
    print_table(
        &["METRIC", "VALUE"],
        vec![
            vec![
                "steps".to_string(),
                format!("{}/{}", m.completed_steps, m.total_steps),
            ],
            vec!["execution_accuracy".to_string(), percent(m.execution_accuracy)],
            vec!["time_deviation".to_string(), percent(m.time_deviation)],
            vec!["quality_compliance".to_string(), percent(m.quality_compliance)],
            vec!["process_efficiency".to_string(), percent(m.process_efficiency)],
        ],
    );
}

// ---------------------------------------------------------------------------
// issues
// ---------------------------------------------------------------------------

pub fn run_issues(ctx: &Context, date: NaiveDate, json: bool) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let store = ctx.open_store()?;
    let found = issues::detect_for_day(&store, &ctx.config.thresholds, actor, date)?;

    if json {
        return print_json(&serde_json::json!({
            "date": date,
            "count": found.len(),
            "issues": found,
        }));
    }

    print_issues(&found);
    Ok(())
}

fn print_issues(found: &[Issue]) {
    if found.is_empty() {
        println!("No issues.");
        return;
    }
    let rows = found
        .iter()
        .map(|i| {
            vec![
                i.kind.as_str().to_string(),
                i.record_id.clone(),
                i.step_id.clone(),
                opt_number(i.score.or(i.duration_minutes)),
                i.description.clone(),
            ]
        })
        .collect();
    print_table(&["TYPE", "RECORD", "STEP", "VALUE", "DESCRIPTION"], rows);
}

// ---------------------------------------------------------------------------
// suggest
// ---------------------------------------------------------------------------

pub fn run_suggest(ctx: &Context, date: NaiveDate, json: bool) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let store = ctx.open_store()?;
    let a = analysis::analyze_day(&store, &ctx.config, actor, date)?;

    if json {
        return print_json(&serde_json::json!({
            "date": date,
            "count": a.suggestions.len(),
            "suggestions": a.suggestions,
        }));
    }

    print_suggestions(&a.suggestions);
    Ok(())
}

fn print_suggestions(suggestions: &[ImprovementSuggestion]) {
    if suggestions.is_empty() {
        println!("No suggestions. The process is running as designed.");
        return;
    }
    for (n, s) in suggestions.iter().enumerate() {
        if n > 0 {
            println!();
        }
        println!("[{}] {}", s.improvement_type, s.title);
        println!("    {}", s.description);
        println!("    {}", s.rationale);
        if let Some(t) = s.expected_time_savings {
            println!("    expected time savings: {t:.0} min");
        }
        if let Some(q) = s.expected_quality_improvement {
            println!("    expected quality improvement: {}", percent(q));
        }
        if let Some(e) = s.expected_effort_reduction {
            println!("    expected effort reduction: {}", percent(e));
        }
    }
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

pub fn run_inspect(ctx: &Context, date: NaiveDate, json: bool) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let store = ctx.open_store()?;
    let inspection = analysis::inspect_day(&store, &ctx.config, actor, date)?;

    if json {
        return print_json(&inspection);
    }

    println!("Inspection for {actor} on {date}");
    println!("Quality score:     {}", percent(inspection.quality_score));
    println!("Compliance score:  {}", percent(inspection.compliance_score));
    println!(
        "Findings:          {} ({} errors)",
        inspection.findings.len(),
        inspection.errors_detected.len()
    );
    if !inspection.findings.is_empty() {
        println!();
        print_issues(&inspection.findings);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

pub fn run_analyze(ctx: &Context, date: NaiveDate, advisory: bool, json: bool) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let store = ctx.open_store()?;
    let a = analysis::analyze_day(&store, &ctx.config, actor, date)?;

    if advisory {
        let bridge = bridge_from_config(&ctx.config.advisory);
        let advised = analysis::advise(a, bridge.as_ref());
        if json {
            return print_json(&advised);
        }
        print_analysis(&advised.analysis);
        println!();
        match &advised.advisory {
            Advisory::Available { response } => {
                println!("Advisory:");
                println!("{}", serde_json::to_string_pretty(response)?);
            }
            Advisory::Unavailable { reason } => println!("Advisory unavailable: {reason}"),
        }
        return Ok(());
    }

    if json {
        return print_json(&a);
    }
    print_analysis(&a);
    Ok(())
}

fn print_analysis(a: &analysis::DailyAnalysis) {
    println!("Analysis for {} on {}", a.actor_id, a.date);
    print_metrics(&a.metrics);
    println!();
    print_issues(&a.issues);
    println!();
    print_suggestions(&a.suggestions);
}
