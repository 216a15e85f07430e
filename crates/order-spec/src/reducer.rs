use thiserror::Error;
use tracing::debug;

use crate::selection::Selection;
use crate::spec::{OptionGroup, Registry};
use crate::visibility::is_applicable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("unknown group 【{0}】")]
    UnknownGroup(String),
    #[error("option '{token}' does not belong to 【{group}】")]
    UnknownToken { group: String, token: String },
    #[error("【{0}】 does not apply to the current selection")]
    NotApplicable(String),
}

/// Replaces `group`'s tokens in `selection` with `values` and clears every
/// group reset by a token this edit newly selected.
///
/// Single-choice groups keep only the last supplied token; the multi-choice
/// group keeps every supplied token. Values outside `group.options` are ignored.
/// Resets are a single pass over the registry and never cascade.
pub fn apply_edit(
    registry: &Registry,
    selection: &Selection,
    group: &OptionGroup,
    values: &[String],
) -> Selection {
    let owned: Vec<&String> = values.iter().filter(|value| group.owns(value)).collect();
    let chosen: Vec<&String> = if registry.is_multi_choice(group) {
        owned
    } else {
        owned.last().copied().into_iter().collect()
    };

    // Re-chosen tokens keep their position so re-affirming a value is a no-op.
    let mut candidate = selection.clone();
    candidate.retain(|token| !group.owns(token) || chosen.contains(&token));
    for token in chosen {
        candidate.insert(token.clone());
    }

    let added: Vec<String> = candidate.difference(selection).cloned().collect();
    if added.is_empty() {
        return candidate;
    }

    let reset: Vec<&OptionGroup> = registry
        .groups
        .iter()
        .filter(|candidate_group| added.iter().any(|token| candidate_group.is_reset_by(token)))
        .collect();

    for reset_group in reset {
        if reset_group.is_answered(&candidate) {
            debug!(
                group = %reset_group.title,
                level = reset_group.level,
                trigger = ?added,
                "resetting group"
            );
        }
        candidate.remove_all(&reset_group.options);
    }

    candidate
}

/// Resolves `title` to its applicable variant and applies the edit, rejecting
/// hidden groups and tokens the group does not own.
pub fn edit_group(
    registry: &Registry,
    selection: &Selection,
    title: &str,
    values: &[String],
) -> Result<Selection, EditError> {
    let group = resolve_group(registry, selection, title)?;
    if let Some(token) = values.iter().find(|value| !group.owns(value)) {
        return Err(EditError::UnknownToken {
            group: group.title.clone(),
            token: token.clone(),
        });
    }
    Ok(apply_edit(registry, selection, group, values))
}

/// First applicable definition titled `title`.
pub fn resolve_group<'a>(
    registry: &'a Registry,
    selection: &Selection,
    title: &str,
) -> Result<&'a OptionGroup, EditError> {
    let mut variants = registry
        .groups
        .iter()
        .filter(|group| group.title == title)
        .peekable();
    if variants.peek().is_none() {
        return Err(EditError::UnknownGroup(title.to_string()));
    }
    variants
        .find(|group| is_applicable(group, selection))
        .ok_or_else(|| EditError::NotApplicable(title.to_string()))
}

/// Rebuilds a consistent selection from a stored token list.
///
/// Unknown tokens and secondary prompt answers are dropped; within a
/// single-choice group the last stored token wins. Returns the selection and
/// the dropped tokens.
pub fn normalize(registry: &Registry, tokens: &[String]) -> (Selection, Vec<String>) {
    let mut selection = Selection::new();
    let mut dropped = Vec::new();
    for token in tokens {
        let Some(owner) = registry.owner_of(token) else {
            dropped.push(token.clone());
            continue;
        };
        if !registry.is_multi_choice(owner) {
            selection.remove_all(&owner.options);
        }
        selection.insert(token.clone());
    }
    if !dropped.is_empty() {
        debug!(dropped = ?dropped, "dropped tokens outside the registry");
    }
    (selection, dropped)
}
