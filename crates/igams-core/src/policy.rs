//! Improvement policy guard.
//!
//! Suggestions change the process, never the person: no added scope, no
//! pressure or urgency, no blame.

use crate::engine::{ImprovementSuggestion, ImprovementType};

pub const ALLOWED_FRAMINGS: &[ImprovementType] = &[
    ImprovementType::Simplify,
    ImprovementType::Remove,
    ImprovementType::Reorder,
    ImprovementType::Merge,
    ImprovementType::Split,
    ImprovementType::Replace,
    ImprovementType::Automate,
];

/// Lower-case phrases that must never appear in suggestion text.
const FORBIDDEN_PHRASES: &[&str] = &[
    // scope increase
    "add more",
    "add a step",
    "add steps",
    "additional step",
    "extra step",
    "increase",
    "more tasks",
    // pressure and urgency
    "urgent",
    "immediately",
    "deadline",
    "try harder",
    "push yourself",
    "more effort",
    "work harder",
    "stay motivated",
    "no excuses",
    // blame
    "your fault",
    "you failed",
    "you should have",
    "lazy",
    "discipline",
];

/// Forbidden phrases found in a suggestion's title, description, or rationale.
pub fn violations(suggestion: &ImprovementSuggestion) -> Vec<&'static str> {
    let text = format!(
        "{}\n{}\n{}",
        suggestion.title, suggestion.description, suggestion.rationale
    )
    .to_lowercase();
    FORBIDDEN_PHRASES
        .iter()
        .copied()
        .filter(|phrase| text.contains(phrase))
        .collect()
}

pub fn is_compliant(suggestion: &ImprovementSuggestion) -> bool {
    ALLOWED_FRAMINGS.contains(&suggestion.improvement_type) && violations(suggestion).is_empty()
}
