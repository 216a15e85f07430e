use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::Condition;
use crate::selection::Selection;
use crate::spec::group::OptionGroup;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("token '{token}' is owned by both '{first}' and '{second}'")]
    DuplicateToken {
        token: String,
        first: String,
        second: String,
    },
    #[error("variants of group '{0}' must list the same options")]
    VariantMismatch(String),
    #[error("multi-choice group '{0}' is not defined")]
    UnknownMultiChoiceGroup(String),
    #[error("secondary prompt token '{0}' collides with a group option")]
    SecondaryCollision(String),
    #[error("rule for '{group}' references unknown token '{token}'")]
    UnknownRuleToken { group: String, token: String },
}

/// Requirement spanning several groups: selecting every `when_all` token
/// demands one of the `require_any` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompositeRule {
    /// Group title reported when the rule fails.
    pub group: String,
    pub when_all: Vec<String>,
    pub require_any: Vec<String>,
}

impl CompositeRule {
    pub fn is_satisfied(&self, selection: &Selection) -> bool {
        let triggered = self.when_all.iter().all(|token| selection.contains(token));
        !triggered || selection.contains_any(&self.require_any)
    }
}

/// Single-choice confirmation asked between validation and commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecondaryPrompt {
    pub title: String,
    pub options: Vec<String>,
    /// The prompt is skipped only when this evaluates to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_when: Option<Condition>,
}

impl SecondaryPrompt {
    pub fn is_needed(&self, selection: &Selection) -> bool {
        self.skip_when
            .as_ref()
            .and_then(|condition| condition.evaluate(selection))
            != Some(true)
    }

    pub fn owns(&self, token: &str) -> bool {
        self.options.iter().any(|option| option == token)
    }
}

/// The full rule catalogue: option groups in declaration order plus the
/// rules that cannot be expressed on a single group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Registry {
    pub id: String,
    pub title: String,
    pub version: String,
    /// Title of the only group that accepts several tokens at once.
    #[serde(default = "default_multi_choice_group")]
    pub multi_choice_group: String,
    pub groups: Vec<OptionGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite_rules: Vec<CompositeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SecondaryPrompt>,
}

pub(crate) fn default_multi_choice_group() -> String {
    "二次工艺".into()
}

impl Registry {
    /// Parses and checks a registry from JSON.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let registry: Registry = serde_json::from_str(json)?;
        registry.check()?;
        Ok(registry)
    }

    /// Verifies token ownership is unambiguous and every rule refers to known tokens.
    pub fn check(&self) -> Result<(), RegistryError> {
        let mut owners: BTreeMap<&str, &OptionGroup> = BTreeMap::new();
        for group in &self.groups {
            for option in &group.options {
                if let Some(owner) = owners.get(option.as_str()) {
                    if owner.title != group.title {
                        return Err(RegistryError::DuplicateToken {
                            token: option.clone(),
                            first: owner.title.clone(),
                            second: group.title.clone(),
                        });
                    }
                    if owner.options != group.options {
                        return Err(RegistryError::VariantMismatch(group.title.clone()));
                    }
                } else {
                    owners.insert(option.as_str(), group);
                }
            }
        }

        if !self
            .groups
            .iter()
            .any(|group| group.title == self.multi_choice_group)
        {
            return Err(RegistryError::UnknownMultiChoiceGroup(
                self.multi_choice_group.clone(),
            ));
        }

        let unknown = |group: &str, token: &str| RegistryError::UnknownRuleToken {
            group: group.to_string(),
            token: token.to_string(),
        };

        for group in &self.groups {
            let referenced = group
                .condition
                .iter()
                .flat_map(|condition| condition.tokens())
                .chain(group.reset_on.iter().map(String::as_str));
            for token in referenced {
                if !owners.contains_key(token) {
                    return Err(unknown(&group.title, token));
                }
            }
        }

        for rule in &self.composite_rules {
            for token in rule.when_all.iter().chain(&rule.require_any) {
                if !owners.contains_key(token.as_str()) {
                    return Err(unknown(&rule.group, token.as_str()));
                }
            }
        }

        if let Some(prompt) = &self.secondary {
            if let Some(token) = prompt
                .options
                .iter()
                .find(|token| owners.contains_key(token.as_str()))
            {
                return Err(RegistryError::SecondaryCollision(token.clone()));
            }
            for token in prompt.skip_when.iter().flat_map(|condition| condition.tokens()) {
                if !owners.contains_key(token) {
                    return Err(unknown(&prompt.title, token));
                }
            }
        }

        Ok(())
    }

    /// First group whose options contain `token`.
    pub fn owner_of(&self, token: &str) -> Option<&OptionGroup> {
        self.groups.iter().find(|group| group.owns(token))
    }

    pub fn is_known_token(&self, token: &str) -> bool {
        self.owner_of(token).is_some()
    }

    /// Every definition carrying `title`, in declaration order.
    pub fn variants<'a, 't>(
        &'a self,
        title: &'t str,
    ) -> impl Iterator<Item = &'a OptionGroup> + 't
    where
        'a: 't,
    {
        self.groups.iter().filter(move |group| group.title == title)
    }

    pub fn is_multi_choice(&self, group: &OptionGroup) -> bool {
        group.title == self.multi_choice_group
    }

    /// Whether the secondary prompt must be answered before committing `selection`.
    pub fn needs_secondary(&self, selection: &Selection) -> bool {
        self.secondary
            .as_ref()
            .is_some_and(|prompt| prompt.is_needed(selection))
    }
}
