use crate::config::Thresholds;
use crate::issues::Issue;
use crate::metrics::DailyMetrics;
use crate::policy;
use crate::rules::default_rules;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

// ---------------------------------------------------------------------------
// ImprovementType
// ---------------------------------------------------------------------------

/// The only framings a suggestion may take. No variant adds steps or raises
/// effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementType {
    Simplify,
    Remove,
    Reorder,
    Merge,
    Split,
    Replace,
    Automate,
}

impl ImprovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImprovementType::Simplify => "simplify",
            ImprovementType::Remove => "remove",
            ImprovementType::Reorder => "reorder",
            ImprovementType::Merge => "merge",
            ImprovementType::Split => "split",
            ImprovementType::Replace => "replace",
            ImprovementType::Automate => "automate",
        }
    }
}

impl fmt::Display for ImprovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

pub struct EvalContext<'a> {
    pub metrics: &'a DailyMetrics,
    pub issues: &'a [Issue],
    pub thresholds: &'a Thresholds,
}

// ---------------------------------------------------------------------------
// ImprovementSuggestion (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementSuggestion {
    /// Id of the rule that produced this suggestion.
    pub rule: String,
    pub improvement_type: ImprovementType,
    pub title: String,
    pub description: String,
    pub rationale: String,
    /// Minutes saved per execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_time_savings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_quality_improvement: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_effort_reduction: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpectedImpact {
    pub time_savings: Option<f64>,
    pub quality_improvement: Option<f64>,
    pub effort_reduction: Option<f64>,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule; title and description are fixed templates so the
/// policy guard can vet them without evaluating anything.
pub struct Rule {
    pub id: &'static str,
    pub condition: fn(&EvalContext) -> bool,
    pub improvement_type: ImprovementType,
    pub title: &'static str,
    pub description: &'static str,
    pub rationale: fn(&EvalContext) -> String,
    pub impact: ExpectedImpact,
}

impl Rule {
    fn suggest(&self, ctx: &EvalContext) -> ImprovementSuggestion {
        ImprovementSuggestion {
            rule: self.id.to_string(),
            improvement_type: self.improvement_type,
            title: self.title.to_string(),
            description: self.description.to_string(),
            rationale: (self.rationale)(ctx),
            expected_time_savings: self.impact.time_savings,
            expected_quality_improvement: self.impact.quality_improvement,
            expected_effort_reduction: self.impact.effort_reduction,
        }
    }
}

// ---------------------------------------------------------------------------
// RecommendationEngine
// ---------------------------------------------------------------------------

/// Stateless rule evaluator. Every rule is checked in table order and every
/// rule whose condition holds contributes one suggestion.
pub struct RecommendationEngine {
    rules: Vec<Rule>,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl RecommendationEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Ids of the rules whose conditions hold, in table order.
    pub fn fired(&self, ctx: &EvalContext) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|r| (r.condition)(ctx))
            .map(|r| r.id)
            .collect()
    }

    pub fn recommend(&self, ctx: &EvalContext) -> Vec<ImprovementSuggestion> {
        let mut out = Vec::new();
        for rule in &self.rules {
            if !(rule.condition)(ctx) {
                continue;
            }
            let suggestion = rule.suggest(ctx);
            let violations = policy::violations(&suggestion);
            if !violations.is_empty() {
                error!(
                    rule = rule.id,
                    ?violations,
                    "suggestion dropped: wording violates the improvement policy"
                );
                continue;
            }
            out.push(suggestion);
        }
        out
    }
}

/// Derive suggestions for one day with the built-in rule table.
pub fn recommend(
    metrics: &DailyMetrics,
    issues: &[Issue],
    thresholds: &Thresholds,
) -> Vec<ImprovementSuggestion> {
    let ctx = EvalContext {
        metrics,
        issues,
        thresholds,
    };
    RecommendationEngine::default().recommend(&ctx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
