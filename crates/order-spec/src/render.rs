use serde::Serialize;

use crate::flow::{Phase, Session, Target};
use crate::selection::Selection;
use crate::spec::{OptionGroup, Registry};
use crate::visibility::applicable_groups;

/// One selectable token as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOption {
    pub token: String,
    pub selected: bool,
}

/// An applicable group ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderGroup {
    pub title: String,
    pub level: u8,
    pub required: bool,
    pub multi_choice: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_option: Option<String>,
    pub options: Vec<RenderOption>,
}

/// The open secondary prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPrompt {
    pub title: String,
    pub options: Vec<RenderOption>,
}

/// Everything a front end needs to draw the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_title: String,
    pub phase: &'static str,
    pub target: Option<Target>,
    pub selection: Selection,
    pub groups: Vec<RenderGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<RenderPrompt>,
}

fn render_options(options: &[String], selection: &Selection) -> Vec<RenderOption> {
    options
        .iter()
        .map(|token| RenderOption {
            token: token.clone(),
            selected: selection.contains(token),
        })
        .collect()
}

fn render_group(registry: &Registry, group: &OptionGroup, selection: &Selection) -> RenderGroup {
    RenderGroup {
        title: group.title.clone(),
        level: group.level,
        required: group.required,
        multi_choice: registry.is_multi_choice(group),
        parent_option: group.parent_option.clone(),
        options: render_options(&group.options, selection),
    }
}

/// Applicable groups for `selection`, in registry order.
pub fn render_groups(registry: &Registry, selection: &Selection) -> Vec<RenderGroup> {
    applicable_groups(registry, selection)
        .map(|group| render_group(registry, group, selection))
        .collect()
}

pub fn build_render_payload(session: &Session) -> RenderPayload {
    let registry = session.registry();
    let secondary = match (session.phase(), &registry.secondary) {
        (Phase::SecondaryPromptOpen { choice, .. }, Some(prompt)) => Some(RenderPrompt {
            title: prompt.title.clone(),
            options: render_options(&prompt.options, choice),
        }),
        _ => None,
    };

    RenderPayload {
        form_id: registry.id.clone(),
        form_title: registry.title.clone(),
        phase: session.phase().name(),
        target: session.target().cloned(),
        selection: session.selection().clone(),
        groups: render_groups(registry, session.selection()),
        secondary,
    }
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", payload.form_title, payload.form_id));
    match &payload.target {
        Some(target) => lines.push(format!("Record: {} [{}]", target, payload.phase)),
        None => lines.push(format!("Record: none [{}]", payload.phase)),
    }

    for group in &payload.groups {
        let indent = "  ".repeat(usize::from(group.level.saturating_sub(1)));
        let mut entry = format!("{}{}", indent, group.title);
        if group.required {
            entry.push_str(" *");
        }
        if group.multi_choice {
            entry.push_str(" (multiple)");
        }
        entry.push(':');
        for option in &group.options {
            let mark = if option.selected { "x" } else { " " };
            entry.push_str(&format!(" [{}] {}", mark, option.token));
        }
        lines.push(entry);
    }

    if let Some(prompt) = &payload.secondary {
        let mut entry = format!("{} *:", prompt.title);
        for option in &prompt.options {
            let mark = if option.selected { "x" } else { " " };
            entry.push_str(&format!(" [{}] {}", mark, option.token));
        }
        lines.push(entry);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::flow::Target;

    #[test]
    fn text_marks_selected_tokens_and_nesting() {
        let mut session = Session::new(Arc::new(Registry::order_config()));
        session.retarget(Some(Target::new("tbl", "rec")));
        session
            .edit("单据类型", &["首单".to_string()])
            .expect("edit");
        let text = render_text(&build_render_payload(&session));
        assert!(text.contains("Record: tbl/rec [editing]"));
        assert!(text.contains("单据类型 *: [x] 首单 [ ] 翻单"));
        assert!(text.contains("  是否要打板: [ ] 需要打板 [ ] 不需要打板"));
        assert!(text.contains("二次工艺 (multiple):"));
        assert!(!text.contains("翻单变动"));
    }

    #[test]
    fn payload_serializes_prompt_only_when_open() {
        let session = Session::new(Arc::new(Registry::order_config()));
        let value = serde_json::to_value(build_render_payload(&session)).expect("json");
        assert_eq!(value["phase"], "idle");
        assert!(value.get("secondary").is_none());
        assert_eq!(value["groups"].as_array().map(Vec::len), Some(5));
    }
}
