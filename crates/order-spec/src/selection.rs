use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Ordered set of selected tokens, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Selection {
    tokens: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection, dropping repeated tokens after their first occurrence.
    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut selection = Self::new();
        for token in tokens {
            selection.insert(token);
        }
        selection
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|selected| selected == token)
    }

    pub fn contains_any<'a>(&self, tokens: impl IntoIterator<Item = &'a String>) -> bool {
        tokens.into_iter().any(|token| self.contains(token))
    }

    /// Appends the token unless already present. Returns whether it was added.
    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        if self.contains(&token) {
            return false;
        }
        self.tokens.push(token);
        true
    }

    pub fn retain(&mut self, keep: impl FnMut(&String) -> bool) {
        self.tokens.retain(keep);
    }

    /// Removes every token listed in `tokens`.
    pub fn remove_all(&mut self, tokens: &[String]) {
        self.tokens.retain(|token| !tokens.contains(token));
    }

    /// Tokens present in `self` but not in `other`, in `self` order.
    pub fn difference<'a>(&'a self, other: &'a Selection) -> impl Iterator<Item = &'a String> {
        self.tokens.iter().filter(move |token| !other.contains(token))
    }

    /// Selected tokens that belong to `options`, in selection order.
    pub fn within<'a>(&'a self, options: &'a [String]) -> impl Iterator<Item = &'a String> {
        self.tokens.iter().filter(move |token| options.contains(token))
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tokens = Vec::<String>::deserialize(deserializer)?;
        Ok(Selection::from_tokens(tokens))
    }
}

impl<T: Into<String>> FromIterator<T> for Selection {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Selection::from_tokens(iter)
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
