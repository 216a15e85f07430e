pub mod store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use order_spec::{
    DoneReason, FlowError, Registry, RegistryError, RenderPayload, Retarget, Session,
    Submission, Target, build_render_payload,
};

pub use store::{JsonFileStore, MemoryStore, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("invalid registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to parse command: {0}")]
    CommandParse(#[source] serde_json::Error),
}

/// Host configuration. Without a registry the built-in catalogue is used.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ComponentConfig {
    #[serde(default)]
    pub registry_json: Option<String>,
}

/// Parses the host config and returns the registry it selects.
pub fn load_registry(config_json: &str) -> Result<Registry, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    match config.registry_json.as_deref() {
        Some(json) => Ok(Registry::from_json(json)?),
        None => Ok(Registry::order_config()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Session state after one host call, with at most one user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: ResponseStatus,
    pub phase: &'static str,
    pub target: Option<Target>,
    pub selection: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Tokens handed to the store by this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed: Option<Vec<String>>,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| {
            json!({ "status": "error", "message": format!("json encode: {}", error) }).to_string()
        })
    }
}

/// Host-side command, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    Focus {
        #[serde(default)]
        target: Option<Target>,
    },
    Edit {
        group: String,
        #[serde(default)]
        values: Vec<String>,
    },
    Submit,
    Cancel,
    ChooseSecondary {
        #[serde(default)]
        values: Vec<String>,
    },
    ConfirmSecondary {
        #[serde(default)]
        token: Option<String>,
    },
    CancelSecondary,
    View,
}

/// Drives one editing session against a record store.
pub struct OrderComponent<S> {
    session: Session,
    store: S,
}

impl<S: RecordStore> OrderComponent<S> {
    pub fn new(registry: Arc<Registry>, store: S) -> Self {
        Self {
            session: Session::new(registry),
            store,
        }
    }

    pub fn from_config(config_json: &str, store: S) -> Result<Self, ComponentError> {
        Ok(Self::new(Arc::new(load_registry(config_json)?), store))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> RenderPayload {
        build_render_payload(&self.session)
    }

    /// Host notification that the focused record changed.
    pub fn focus(&mut self, target: Option<Target>) -> Response {
        match self.session.retarget(target) {
            Retarget::Unchanged => self.ok(None),
            Retarget::Deferred => self.ok(Some(
                "the record change will apply once saving finishes".into(),
            )),
            Retarget::Reset => self.load_target(),
        }
    }

    fn load_target(&mut self) -> Response {
        let Some(target) = self.session.target().cloned() else {
            return self.ok(None);
        };
        let stored = match self.store.read(&target) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(record = %target, error = %error, "failed to read stored selection");
                return self.error("failed to load the selected record".into());
            }
        };
        if let Some(tokens) = stored {
            match self.session.load(&tokens) {
                Ok(dropped) if !dropped.is_empty() => {
                    debug!(record = %target, dropped = ?dropped, "stored tokens ignored");
                }
                Ok(_) => {}
                Err(error) => return self.error(error.to_string()),
            }
        }
        self.ok(None)
    }

    pub fn edit(&mut self, group: &str, values: &[String]) -> Response {
        match self.session.edit(group, values) {
            Ok(_) => self.ok(None),
            Err(error) => self.flow_error(error),
        }
    }

    pub fn submit(&mut self) -> Response {
        match self.session.submit() {
            Ok(Submission::Commit(request)) => self.persist(request.target, request.tokens),
            Ok(Submission::SecondaryPrompt) => self.ok(None),
            Err(error) => self.flow_error(error),
        }
    }

    pub fn cancel(&mut self) -> Response {
        match self.session.cancel() {
            Ok(()) => self.ok(None),
            Err(error) => self.flow_error(error),
        }
    }

    pub fn choose_secondary(&mut self, values: &[String]) -> Response {
        match self.session.select_secondary(values) {
            Ok(_) => self.ok(None),
            Err(error) => self.flow_error(error),
        }
    }

    pub fn confirm_secondary(&mut self, token: Option<&str>) -> Response {
        match self.session.confirm_secondary(token) {
            Ok(request) => self.persist(request.target, request.tokens),
            Err(error) => self.flow_error(error),
        }
    }

    pub fn cancel_secondary(&mut self) -> Response {
        match self.session.cancel_secondary() {
            Ok(()) => self.ok(None),
            Err(error) => self.flow_error(error),
        }
    }

    /// Applies a command and returns the response.
    pub fn handle(&mut self, command: Command) -> Response {
        match command {
            Command::Focus { target } => self.focus(target),
            Command::Edit { group, values } => self.edit(&group, &values),
            Command::Submit => self.submit(),
            Command::Cancel => self.cancel(),
            Command::ChooseSecondary { values } => self.choose_secondary(&values),
            Command::ConfirmSecondary { token } => self.confirm_secondary(token.as_deref()),
            Command::CancelSecondary => self.cancel_secondary(),
            Command::View => self.ok(None),
        }
    }

    /// JSON in, JSON out. A `view` command returns the render payload.
    pub fn handle_json(&mut self, command_json: &str) -> String {
        let command: Command = match serde_json::from_str(command_json) {
            Ok(command) => command,
            Err(error) => {
                return json!({ "status": "error", "message": ComponentError::CommandParse(error).to_string() })
                    .to_string();
            }
        };
        if command == Command::View {
            return serde_json::to_value(self.view())
                .unwrap_or_else(|error| json!({ "status": "error", "message": error.to_string() }))
                .to_string();
        }
        self.handle(command).to_json()
    }

    fn persist(&mut self, target: Target, tokens: Vec<String>) -> Response {
        let field = (!tokens.is_empty()).then_some(tokens.as_slice());
        let result = self
            .store
            .write(&target, field)
            .map_err(|error| error.to_string());

        match self.session.complete_commit(result) {
            Ok(DoneReason::Committed) => Response {
                committed: Some(tokens),
                ..self.ok(Some("selection saved".into()))
            },
            Ok(DoneReason::Discarded { message }) => {
                self.error(format!("failed to save: {}", message))
            }
            Ok(DoneReason::Aborted) => self.ok(None),
            Err(error) => self.flow_error(error),
        }
    }

    fn flow_error(&self, error: FlowError) -> Response {
        debug!(phase = self.session.phase().name(), error = %error, "command rejected");
        self.error(error.to_string())
    }

    fn ok(&self, message: Option<String>) -> Response {
        self.response(ResponseStatus::Ok, message)
    }

    fn error(&self, message: String) -> Response {
        self.response(ResponseStatus::Error, Some(message))
    }

    fn response(&self, status: ResponseStatus, message: Option<String>) -> Response {
        Response {
            status,
            phase: self.session.phase().name(),
            target: self.session.target().cloned(),
            selection: self.session.selection().as_slice().to_vec(),
            message,
            committed: None,
        }
    }
}
