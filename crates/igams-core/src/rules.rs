use crate::engine::{EvalContext, ExpectedImpact, ImprovementType, Rule};
use crate::issues::{count_kind, IssueKind};

// ---------------------------------------------------------------------------
// Helper macro for concise rule definitions
// ---------------------------------------------------------------------------

macro_rules! rule {
    (
        id: $id:expr,
        condition: $cond:expr,
        improvement_type: $kind:expr,
        title: $title:expr,
        description: $desc:expr,
        rationale: $rat:expr
        $(, time_savings: $time:expr)?
        $(, quality_improvement: $quality:expr)?
        $(, effort_reduction: $effort:expr)?
    ) => {
        Rule {
            id: $id,
            condition: $cond,
            improvement_type: $kind,
            title: $title,
            description: $desc,
            rationale: $rat,
            impact: ExpectedImpact {
                time_savings: {
                    #[allow(unused_assignments, unused_mut)]
                    let mut v: Option<f64> = None;
                    $(v = Some($time);)?
                    v
                },
                quality_improvement: {
                    #[allow(unused_assignments, unused_mut)]
                    let mut v: Option<f64> = None;
                    $(v = Some($quality);)?
                    v
                },
                effort_reduction: {
                    #[allow(unused_assignments, unused_mut)]
                    let mut v: Option<f64> = None;
                    $(v = Some($effort);)?
                    v
                },
            },
        }
    };
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn skip_count(ctx: &EvalContext) -> usize {
    count_kind(ctx.issues, IssueKind::Skipped)
}

// ---------------------------------------------------------------------------
// Conditions and rationales
// ---------------------------------------------------------------------------

fn low_quality_compliance(ctx: &EvalContext) -> bool {
    ctx.metrics.quality_compliance < ctx.thresholds.quality_compliance_floor
}

fn low_quality_compliance_rationale(ctx: &EvalContext) -> String {
    format!(
        "Current quality compliance: {}",
        percent(ctx.metrics.quality_compliance)
    )
}

fn time_overrun_ratio(ctx: &EvalContext) -> bool {
    ctx.metrics.time_deviation > ctx.thresholds.time_deviation_ceiling
}

fn time_overrun_ratio_rationale(ctx: &EvalContext) -> String {
    format!("Time deviation: {}", percent(ctx.metrics.time_deviation))
}

fn low_execution_accuracy(ctx: &EvalContext) -> bool {
    ctx.metrics.execution_accuracy < ctx.thresholds.execution_accuracy_floor
}

fn low_execution_accuracy_rationale(ctx: &EvalContext) -> String {
    format!(
        "Execution accuracy: {}",
        percent(ctx.metrics.execution_accuracy)
    )
}

fn repeated_skips(ctx: &EvalContext) -> bool {
    skip_count(ctx) >= ctx.thresholds.repeated_skip_count
}

fn repeated_skips_rationale(ctx: &EvalContext) -> String {
    format!("{} steps skipped", skip_count(ctx))
}

// ---------------------------------------------------------------------------
// Default rule table
// ---------------------------------------------------------------------------

/// Built-in rules, evaluated in this order. Every firing rule contributes.
pub fn default_rules() -> Vec<Rule> {
    vec![
        rule!(
            id: "low_quality_compliance",
            condition: low_quality_compliance,
            improvement_type: ImprovementType::Simplify,
            title: "Simplify Quality Criteria",
            description: "Quality compliance is low. Simplify the quality criteria, \
                or split steps into smaller parts with clearer completion criteria.",
            rationale: low_quality_compliance_rationale,
            quality_improvement: 0.2
        ),
        rule!(
            id: "time_overrun_ratio",
            condition: time_overrun_ratio,
            improvement_type: ImprovementType::Split,
            title: "Reduce Step Complexity",
            description: "Steps are running well past their planned duration. Split \
                complex steps into smaller ones or remove the parts that are not essential.",
            rationale: time_overrun_ratio_rationale,
            time_savings: 30.0
        ),
        rule!(
            id: "low_execution_accuracy",
            condition: low_execution_accuracy,
            improvement_type: ImprovementType::Remove,
            title: "Remove Unnecessary Steps",
            description: "Many planned steps are not being completed. Review which steps \
                are essential and remove or defer the ones that are not producing value.",
            rationale: low_execution_accuracy_rationale,
            effort_reduction: 0.3
        ),
        rule!(
            id: "repeated_skips",
            condition: repeated_skips,
            improvement_type: ImprovementType::Remove,
            title: "Review Frequently Skipped Steps",
            description: "Several steps were skipped, which suggests the process carries \
                steps that do not fit the day as designed. Remove them or move them \
                to a better point in the sequence.",
            rationale: repeated_skips_rationale,
            effort_reduction: 0.2
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
