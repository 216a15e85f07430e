use component_order::Response;
use order_spec::{RenderPayload, Target, render_text};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Form and messages only.
    Clean,
    /// Also the phase and raw selection after every command.
    Verbose,
}

impl Verbosity {
    pub fn from_count(count: u8) -> Self {
        if count > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// Prints the form and command results for the text wizard.
pub struct WizardPresenter {
    verbosity: Verbosity,
    mode: RenderMode,
    header_printed: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, mode: RenderMode) -> Self {
        Self {
            verbosity,
            mode,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self) {
        if self.header_printed {
            return;
        }
        println!("Commands: {}", COMMAND_HELP.join(" | "));
        self.header_printed = true;
    }

    pub fn show_form(&self, payload: &RenderPayload) {
        match self.mode {
            RenderMode::Text => println!("{}", render_text(payload)),
            RenderMode::Json => match serde_json::to_string_pretty(payload) {
                Ok(json) => println!("{}", json),
                Err(err) => eprintln!("Failed to serialize the form to JSON: {}", err),
            },
        }
    }

    pub fn show_response(&self, response: &Response) {
        if let Some(message) = &response.message {
            if response.is_ok() {
                println!("{}", message);
            } else {
                eprintln!("Error: {}", message);
            }
        }
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} [{}]",
                response.phase,
                response.selection.join(", ")
            );
        }
    }

    pub fn show_parse_error(&self, error: &CommandParseError) {
        eprintln!("Invalid command: {}", error.user_message);
        if let Some(usage) = &error.usage {
            eprintln!("  Usage: {}", usage);
        }
    }

    pub fn show_completion(&self, tokens: &[String]) {
        println!("Done ✅");
        match serde_json::to_string(tokens) {
            Ok(json) => println!("Stored: {}", json),
            Err(err) => eprintln!("Failed to serialize the selection to JSON: {}", err),
        }
        match serde_cbor::to_vec(&tokens) {
            Ok(bytes) => println!("Stored (CBOR hex): {}", encode_hex(&bytes)),
            Err(err) => eprintln!("Failed to serialize the selection to CBOR: {}", err),
        }
    }
}

const COMMAND_HELP: [&str; 9] = [
    "show",
    "set <group> [options...]",
    "submit",
    "choose <option>",
    "confirm [option]",
    "back",
    "cancel",
    "focus <table> <record>",
    "exit",
];

/// One line of wizard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    Empty,
    Show,
    Set { group: String, values: Vec<String> },
    Submit,
    Choose(String),
    Confirm(Option<String>),
    Back,
    Cancel,
    Focus(Target),
    Exit,
}

/// Error produced when a wizard line cannot be understood.
#[derive(Debug)]
pub struct CommandParseError {
    pub user_message: String,
    pub usage: Option<&'static str>,
}

impl CommandParseError {
    fn new(user_message: impl Into<String>, usage: Option<&'static str>) -> Self {
        Self {
            user_message: user_message.into(),
            usage,
        }
    }
}

pub fn parse_command(line: &str) -> Result<WizardCommand, CommandParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(WizardCommand::Empty);
    };
    let rest: Vec<String> = words.map(String::from).collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "show" => WizardCommand::Show,
        "submit" => WizardCommand::Submit,
        "back" => WizardCommand::Back,
        "cancel" => WizardCommand::Cancel,
        "exit" | "quit" => WizardCommand::Exit,
        "set" => {
            let mut rest = rest.into_iter();
            let group = rest.next().ok_or_else(|| {
                CommandParseError::new("set needs a group title", Some(COMMAND_HELP[1]))
            })?;
            WizardCommand::Set {
                group,
                values: rest.collect(),
            }
        }
        "choose" => match rest.as_slice() {
            [token] => WizardCommand::Choose(token.clone()),
            _ => {
                return Err(CommandParseError::new(
                    "choose takes exactly one option",
                    Some(COMMAND_HELP[3]),
                ));
            }
        },
        "confirm" => match rest.as_slice() {
            [] => WizardCommand::Confirm(None),
            [token] => WizardCommand::Confirm(Some(token.clone())),
            _ => {
                return Err(CommandParseError::new(
                    "confirm takes at most one option",
                    Some(COMMAND_HELP[4]),
                ));
            }
        },
        "focus" => match rest.as_slice() {
            [table, record] => WizardCommand::Focus(Target::new(table.as_str(), record.as_str())),
            _ => {
                return Err(CommandParseError::new(
                    "focus needs a table and a record id",
                    Some(COMMAND_HELP[7]),
                ));
            }
        },
        other => {
            return Err(CommandParseError::new(
                format!("unknown command '{}'", other),
                None,
            ));
        }
    };
    Ok(command)
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
