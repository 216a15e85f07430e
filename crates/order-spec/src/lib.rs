#![allow(missing_docs)]

pub mod expr;
pub mod flow;
pub mod reducer;
pub mod render;
pub mod selection;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use expr::Condition;
pub use flow::{
    CommitRequest, DoneReason, FlowError, Phase, Retarget, Session, Submission, Target,
};
pub use reducer::{EditError, apply_edit, edit_group, normalize, resolve_group};
pub use render::{
    RenderGroup, RenderOption, RenderPayload, RenderPrompt, build_render_payload, render_groups,
    render_text,
};
pub use selection::Selection;
pub use spec::{CompositeRule, OptionGroup, Registry, RegistryError, SecondaryPrompt};
pub use validate::{ValidationOutcome, ValidationReport, validate, validate_report};
pub use visibility::{applicable_groups, is_applicable, resolve_visibility};
