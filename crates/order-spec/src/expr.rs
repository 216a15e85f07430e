use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::selection::Selection;

/// Data-only condition language evaluated against the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    LiteralBool { value: bool },
    Contains { token: String },
    AllOf { tokens: Vec<String> },
    AnyOf { tokens: Vec<String> },
    Not { condition: Box<Condition> },
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
}

impl Condition {
    pub fn contains(token: impl Into<String>) -> Self {
        Condition::Contains {
            token: token.into(),
        }
    }

    pub fn all_of<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Condition::AllOf {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn any_of<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Condition::AnyOf {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluates the condition to a boolean if possible.
    ///
    /// Empty token or condition lists carry no explicit boolean and yield `None`.
    pub fn evaluate(&self, selection: &Selection) -> Option<bool> {
        match self {
            Condition::LiteralBool { value } => Some(*value),
            Condition::Contains { token } => Some(selection.contains(token)),
            Condition::AllOf { tokens } => {
                if tokens.is_empty() {
                    return None;
                }
                Some(tokens.iter().all(|token| selection.contains(token)))
            }
            Condition::AnyOf { tokens } => {
                if tokens.is_empty() {
                    return None;
                }
                Some(tokens.iter().any(|token| selection.contains(token)))
            }
            Condition::Not { condition } => condition.evaluate(selection).map(|value| !value),
            Condition::And { conditions } => {
                if conditions.is_empty() {
                    return None;
                }
                for condition in conditions {
                    match condition.evaluate(selection) {
                        Some(true) => continue,
                        Some(false) => return Some(false),
                        None => return None,
                    }
                }
                Some(true)
            }
            Condition::Or { conditions } => {
                if conditions.is_empty() {
                    return None;
                }
                for condition in conditions {
                    if let Some(true) = condition.evaluate(selection) {
                        return Some(true);
                    }
                }
                Some(false)
            }
        }
    }

    /// Every token the condition mentions, in declaration order.
    pub fn tokens(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::LiteralBool { .. } => {}
            Condition::Contains { token } => out.push(token),
            Condition::AllOf { tokens } | Condition::AnyOf { tokens } => {
                out.extend(tokens.iter().map(String::as_str))
            }
            Condition::Not { condition } => condition.collect_tokens(out),
            Condition::And { conditions } | Condition::Or { conditions } => {
                for condition in conditions {
                    condition.collect_tokens(out);
                }
            }
        }
    }
}
