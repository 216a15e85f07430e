use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::reducer::{EditError, edit_group, normalize};
use crate::selection::Selection;
use crate::spec::Registry;
use crate::validate::{ValidationOutcome, missing_message, validate};

/// Host record the session edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct Target {
    pub table_id: String,
    pub record_id: String,
}

impl Target {
    pub fn new(table_id: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            record_id: record_id.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table_id, self.record_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("{}", missing_message(.group))]
    Validation { group: String },
    #[error("please choose one option in 【{prompt}】")]
    SecondaryPromptIncomplete { prompt: String },
    #[error("the selection is being saved; wait for it to finish")]
    Busy,
    #[error("no record is selected")]
    NoTarget,
    #[error("cannot do that while the session is {0}")]
    NotEditing(&'static str),
    #[error("the secondary prompt is not open")]
    NoSecondaryPrompt,
    #[error("no commit is in progress")]
    NotCommitting,
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Final token list the host must persist for `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitRequest {
    pub target: Target,
    pub tokens: Vec<String>,
}

/// Why a session reached `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DoneReason {
    Committed,
    /// The store rejected the write; the selection was dropped anyway.
    Discarded { message: String },
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Editing,
    SecondaryPromptOpen { draft: Selection, choice: Selection },
    Committing { request: CommitRequest },
    Done(DoneReason),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Editing => "editing",
            Phase::SecondaryPromptOpen { .. } => "secondary_prompt_open",
            Phase::Committing { .. } => "committing",
            Phase::Done(_) => "done",
        }
    }
}

/// What `submit` led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Commit(CommitRequest),
    SecondaryPrompt,
}

/// Outcome of a target notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retarget {
    Unchanged,
    Reset,
    /// Arrived while committing; applied once the commit completes.
    Deferred,
}

/// One user's editing session over the current target record.
#[derive(Debug, Clone)]
pub struct Session {
    registry: Arc<Registry>,
    target: Option<Target>,
    selection: Selection,
    phase: Phase,
    pending_target: Option<Option<Target>>,
}

impl Session {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            target: None,
            selection: Selection::new(),
            phase: Phase::Idle,
            pending_target: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Committing { .. })
    }

    /// Secondary prompt choice, when the prompt is open.
    pub fn secondary_choice(&self) -> Option<&Selection> {
        match &self.phase {
            Phase::SecondaryPromptOpen { choice, .. } => Some(choice),
            _ => None,
        }
    }

    /// Handles a host focus change. A different target discards any unsaved edit.
    pub fn retarget(&mut self, target: Option<Target>) -> Retarget {
        if self.is_busy() {
            debug!(record = ?target, "target change deferred until commit completes");
            self.pending_target = Some(target);
            return Retarget::Deferred;
        }

        let active = matches!(
            self.phase,
            Phase::Editing | Phase::SecondaryPromptOpen { .. }
        );
        if active && self.target == target {
            return Retarget::Unchanged;
        }

        if active && (!self.selection.is_empty() || self.secondary_choice().is_some()) {
            info!(
                from = ?self.target.as_ref().map(ToString::to_string),
                to = ?target.as_ref().map(ToString::to_string),
                "target changed; discarding unsaved selection"
            );
        }

        self.selection.clear();
        self.phase = if target.is_some() {
            Phase::Editing
        } else {
            Phase::Idle
        };
        self.target = target;
        Retarget::Reset
    }

    /// Seeds the selection from a previously stored token list. Returns the dropped tokens.
    pub fn load(&mut self, tokens: &[String]) -> Result<Vec<String>, FlowError> {
        self.ensure_editing()?;
        let (selection, dropped) = normalize(&self.registry, tokens);
        self.selection = selection;
        Ok(dropped)
    }

    /// Replaces the tokens of the group titled `title`.
    pub fn edit(&mut self, title: &str, values: &[String]) -> Result<&Selection, FlowError> {
        self.ensure_editing()?;
        self.selection = edit_group(&self.registry, &self.selection, title, values)?;
        Ok(&self.selection)
    }

    /// Validates the selection and either starts the commit or opens the secondary prompt.
    pub fn submit(&mut self) -> Result<Submission, FlowError> {
        self.ensure_editing()?;

        if let ValidationOutcome::Missing { group } = validate(&self.registry, &self.selection) {
            debug!(group = %group, "submission rejected");
            return Err(FlowError::Validation { group });
        }

        if self.registry.needs_secondary(&self.selection) {
            debug!("opening secondary prompt");
            self.phase = Phase::SecondaryPromptOpen {
                draft: self.selection.clone(),
                choice: Selection::new(),
            };
            return Ok(Submission::SecondaryPrompt);
        }

        let tokens = self.selection.as_slice().to_vec();
        self.begin_commit(tokens).map(Submission::Commit)
    }

    /// Replaces the secondary prompt choice, keeping only the last supplied token.
    pub fn select_secondary(&mut self, values: &[String]) -> Result<&Selection, FlowError> {
        if !matches!(self.phase, Phase::SecondaryPromptOpen { .. }) {
            return Err(self.phase_error());
        }
        let prompt = self
            .registry
            .secondary
            .as_ref()
            .ok_or(FlowError::NoSecondaryPrompt)?;
        if let Some(token) = values.iter().find(|value| !prompt.owns(value)) {
            return Err(EditError::UnknownToken {
                group: prompt.title.clone(),
                token: token.clone(),
            }
            .into());
        }
        if let Phase::SecondaryPromptOpen { choice, .. } = &mut self.phase {
            *choice = values.last().cloned().into_iter().collect();
        }
        self.secondary_choice().ok_or(FlowError::NoSecondaryPrompt)
    }

    /// Commits the snapshot plus the prompt choice. `token`, when given, is chosen first.
    pub fn confirm_secondary(&mut self, token: Option<&str>) -> Result<CommitRequest, FlowError> {
        if let Some(token) = token {
            self.select_secondary(&[token.to_string()])?;
        }
        let Phase::SecondaryPromptOpen { draft, choice } = &self.phase else {
            return Err(self.phase_error());
        };
        if choice.is_empty() {
            let prompt = self
                .registry
                .secondary
                .as_ref()
                .map(|prompt| prompt.title.clone())
                .unwrap_or_default();
            return Err(FlowError::SecondaryPromptIncomplete { prompt });
        }
        let tokens = draft.iter().chain(choice.iter()).cloned().collect::<Selection>();
        self.begin_commit(tokens.into_vec())
    }

    /// Closes the prompt and returns to editing with the pre-submit selection.
    pub fn cancel_secondary(&mut self) -> Result<(), FlowError> {
        if !matches!(self.phase, Phase::SecondaryPromptOpen { .. }) {
            return Err(self.phase_error());
        }
        debug!("secondary prompt cancelled");
        self.phase = Phase::Editing;
        Ok(())
    }

    /// Abandons the primary form.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        self.ensure_editing()?;
        debug!("editing cancelled");
        self.finish(DoneReason::Aborted);
        Ok(())
    }

    /// Records the persistence result. Either way the session ends and forgets the selection.
    pub fn complete_commit(&mut self, result: Result<(), String>) -> Result<DoneReason, FlowError> {
        let Phase::Committing { request } = &self.phase else {
            return Err(FlowError::NotCommitting);
        };
        let reason = match result {
            Ok(()) => {
                info!(record = %request.target, tokens = request.tokens.len(), "selection saved");
                DoneReason::Committed
            }
            Err(message) => {
                warn!(record = %request.target, error = %message, "save failed; selection discarded");
                DoneReason::Discarded { message }
            }
        };
        self.finish(reason.clone());

        if let Some(target) = self.pending_target.take() {
            self.retarget(target);
        }
        Ok(reason)
    }

    fn begin_commit(&mut self, tokens: Vec<String>) -> Result<CommitRequest, FlowError> {
        let target = self.target.clone().ok_or(FlowError::NoTarget)?;
        let request = CommitRequest { target, tokens };
        debug!(record = %request.target, tokens = ?request.tokens, "committing");
        self.phase = Phase::Committing {
            request: request.clone(),
        };
        Ok(request)
    }

    fn finish(&mut self, reason: DoneReason) {
        self.selection.clear();
        self.target = None;
        self.phase = Phase::Done(reason);
    }

    fn ensure_editing(&self) -> Result<(), FlowError> {
        match self.phase {
            Phase::Editing => Ok(()),
            _ => Err(self.phase_error()),
        }
    }

    fn phase_error(&self) -> FlowError {
        match &self.phase {
            Phase::Committing { .. } => FlowError::Busy,
            Phase::Idle | Phase::Done(_) => FlowError::NoTarget,
            Phase::Editing => FlowError::NoSecondaryPrompt,
            other => FlowError::NotEditing(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn editing_session() -> Session {
        let mut session = Session::new(Arc::new(Registry::order_config()));
        session.retarget(Some(Target::new("tbl", "rec1")));
        session
    }

    fn fill_root_groups(session: &mut Session) {
        session.edit("品类", &tokens(&["时装"])).expect("edit");
        session.edit("复杂度", &tokens(&["基础款"])).expect("edit");
        session.edit("产能", &tokens(&["有产能"])).expect("edit");
    }

    #[test]
    fn edits_require_a_target() {
        let mut session = Session::new(Arc::new(Registry::order_config()));
        assert_eq!(
            session.edit("品类", &tokens(&["牛仔"])).unwrap_err(),
            FlowError::NoTarget
        );
    }

    #[test]
    fn same_target_keeps_the_selection() {
        let mut session = editing_session();
        session.edit("品类", &tokens(&["牛仔"])).expect("edit");
        assert_eq!(
            session.retarget(Some(Target::new("tbl", "rec1"))),
            Retarget::Unchanged
        );
        assert_eq!(session.selection().len(), 1);
    }

    #[test]
    fn validation_failure_stays_in_editing() {
        let mut session = editing_session();
        let err = session.submit().unwrap_err();
        assert_eq!(err.to_string(), "please select at least one option in 【单据类型】");
        assert_eq!(session.phase(), &Phase::Editing);
    }

    #[test]
    fn cancel_secondary_returns_to_editing_with_selection() {
        let mut session = editing_session();
        session.edit("单据类型", &tokens(&["首单"])).expect("edit");
        session.edit("是否要打板", &tokens(&["需要打板"])).expect("edit");
        fill_root_groups(&mut session);
        let before = session.selection().clone();

        assert_eq!(session.submit().expect("submit"), Submission::SecondaryPrompt);
        session.cancel_secondary().expect("cancel");
        assert_eq!(session.phase(), &Phase::Editing);
        assert_eq!(session.selection(), &before);
        assert_eq!(session.submit().expect("resubmit"), Submission::SecondaryPrompt);
        assert_eq!(session.secondary_choice().map(Selection::len), Some(0));
    }

    #[test]
    fn busy_while_committing_and_defers_retarget() {
        let mut session = editing_session();
        session.edit("单据类型", &tokens(&["翻单"])).expect("edit");
        session.edit("翻单变动", &tokens(&["无变动不需要修改"])).expect("edit");
        fill_root_groups(&mut session);
        assert!(matches!(session.submit(), Ok(Submission::Commit(_))));

        assert_eq!(
            session.edit("品类", &tokens(&["牛仔"])).unwrap_err(),
            FlowError::Busy
        );
        assert_eq!(session.cancel().unwrap_err(), FlowError::Busy);
        assert_eq!(
            session.retarget(Some(Target::new("tbl", "rec2"))),
            Retarget::Deferred
        );

        assert_eq!(session.complete_commit(Ok(())), Ok(DoneReason::Committed));
        assert_eq!(session.phase(), &Phase::Editing);
        assert_eq!(session.target(), Some(&Target::new("tbl", "rec2")));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn cancel_aborts_and_clears() {
        let mut session = editing_session();
        session.edit("品类", &tokens(&["牛仔"])).expect("edit");
        session.cancel().expect("cancel");
        assert_eq!(session.phase(), &Phase::Done(DoneReason::Aborted));
        assert!(session.selection().is_empty());
        assert!(session.target().is_none());
    }

    #[test]
    fn complete_commit_requires_commit_in_flight() {
        let mut session = editing_session();
        assert_eq!(
            session.complete_commit(Ok(())).unwrap_err(),
            FlowError::NotCommitting
        );
    }

    #[test]
    fn load_normalizes_stored_tokens() {
        let mut session = editing_session();
        let dropped = session
            .load(&tokens(&["翻单", "有变动需要修改", "需要面料测试"]))
            .expect("load");
        assert_eq!(dropped, tokens(&["需要面料测试"]));
        assert_eq!(
            session.selection().as_slice(),
            &tokens(&["翻单", "有变动需要修改"])
        );
    }
}
