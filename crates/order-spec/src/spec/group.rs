use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::expr::Condition;
use crate::selection::Selection;

/// One question of the questionnaire: a set of selectable tokens plus its rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OptionGroup {
    pub title: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    /// Presentation depth, 1 for root groups.
    #[serde(default = "default_level")]
    pub level: u8,
    /// Option that introduces this group. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Tokens whose fresh selection clears this group's own options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reset_on: Vec<String>,
}

fn default_level() -> u8 {
    1
}

impl OptionGroup {
    pub fn new<I, T>(title: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            title: title.into(),
            options: options.into_iter().map(Into::into).collect(),
            required: false,
            level: default_level(),
            parent_option: None,
            condition: None,
            reset_on: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nested(mut self, level: u8, parent_option: impl Into<String>) -> Self {
        self.level = level;
        self.parent_option = Some(parent_option.into());
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn reset_on<I, T>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.reset_on = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn owns(&self, token: &str) -> bool {
        self.options.iter().any(|option| option == token)
    }

    /// Whether any of this group's options is currently selected.
    pub fn is_answered(&self, selection: &Selection) -> bool {
        selection.contains_any(&self.options)
    }

    pub fn is_reset_by(&self, token: &str) -> bool {
        self.reset_on.iter().any(|trigger| trigger == token)
    }
}
