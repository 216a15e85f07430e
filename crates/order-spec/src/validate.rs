use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::selection::Selection;
use crate::spec::Registry;
use crate::visibility::is_applicable;

/// Result of gating a submission: success or the first group left unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Ok,
    Missing { group: String },
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Ok)
    }

    /// User-facing message, `None` when validation passed.
    pub fn message(&self) -> Option<String> {
        match self {
            ValidationOutcome::Ok => None,
            ValidationOutcome::Missing { group } => Some(missing_message(group)),
        }
    }
}

pub fn missing_message(group: &str) -> String {
    format!("please select at least one option in 【{group}】")
}

/// Checks required applicable groups in declaration order, then the composite rules.
pub fn validate(registry: &Registry, selection: &Selection) -> ValidationOutcome {
    for group in &registry.groups {
        if group.required && is_applicable(group, selection) && !group.is_answered(selection) {
            return ValidationOutcome::Missing {
                group: group.title.clone(),
            };
        }
    }

    for rule in &registry.composite_rules {
        if !rule.is_satisfied(selection) {
            return ValidationOutcome::Missing {
                group: rule.group.clone(),
            };
        }
    }

    ValidationOutcome::Ok
}

/// Full audit of a token list, e.g. one read back from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_tokens: Vec<String>,
    /// Single-choice groups holding more than one token.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
}

/// Reports every problem with `tokens` instead of stopping at the first one.
///
/// Tokens answering the secondary prompt are accepted as known.
pub fn validate_report(registry: &Registry, tokens: &[String]) -> ValidationReport {
    let selection = Selection::from_tokens(tokens.iter().cloned());
    let mut report = ValidationReport::default();

    for token in &selection {
        let answers_prompt = registry
            .secondary
            .as_ref()
            .is_some_and(|prompt| prompt.owns(token));
        if !registry.is_known_token(token) && !answers_prompt {
            report.unknown_tokens.push(token.clone());
        }
    }

    for group in &registry.groups {
        if group.required
            && is_applicable(group, &selection)
            && !group.is_answered(&selection)
            && !report.missing_required.contains(&group.title)
        {
            report.missing_required.push(group.title.clone());
        }
        if !registry.is_multi_choice(group)
            && selection.within(&group.options).count() > 1
            && !report.conflicts.contains(&group.title)
        {
            report.conflicts.push(group.title.clone());
        }
    }

    for rule in &registry.composite_rules {
        if !rule.is_satisfied(&selection) && !report.missing_required.contains(&rule.group) {
            report.missing_required.push(rule.group.clone());
        }
    }

    if let Some(prompt) = &registry.secondary
        && selection.within(&prompt.options).count() > 1
    {
        report.conflicts.push(prompt.title.clone());
    }

    report.valid = report.missing_required.is_empty()
        && report.unknown_tokens.is_empty()
        && report.conflicts.is_empty();
    report
}
