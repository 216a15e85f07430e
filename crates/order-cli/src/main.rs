mod logging;
mod wizard;

use clap::{ArgAction, Parser, Subcommand};
use component_order::{JsonFileStore, OrderComponent, load_registry};
use logging::{LogConfig, init_logging};
use order_spec::{Registry, Target, ValidationReport, validate, validate_report};
use serde_json::json;
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use wizard::{RenderMode, Verbosity, WizardCommand, WizardPresenter, parse_command};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const REGISTRY_ENV: &str = "ORDER_CONFIG_REGISTRY";
const STORE_ENV: &str = "ORDER_CONFIG_STORE";
const DEFAULT_STORE: &str = "order-config.store.json";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Order configuration wizard CLI",
    long_about = "Edits the order configuration of a record, validates token lists and describes the option registry"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Registry JSON replacing the built-in catalogue (defaults to ORDER_CONFIG_REGISTRY).
    #[arg(long, value_name = "REGISTRY", global = true)]
    registry: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Edit one record's selection in a text shell.
    Wizard {
        /// JSON file holding stored selections (defaults to ORDER_CONFIG_STORE or order-config.store.json).
        #[arg(long, value_name = "STORE")]
        store: Option<PathBuf>,
        /// Table id of the record to edit.
        #[arg(long)]
        table: String,
        /// Record id of the record to edit.
        #[arg(long)]
        record: String,
        /// Render output mode for the form.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate a token list against the registry.
    Validate {
        /// Comma separated tokens, in stored order.
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        tokens: Vec<String>,
    },
    /// Print the registry as JSON.
    Describe,
    /// Print the JSON Schema of the registry format.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_ansi(io::stderr().is_terminal()));

    match cli.command {
        Command::Wizard {
            store,
            table,
            record,
            format,
        } => {
            let registry = resolve_registry(cli.registry)?;
            let store = resolve_store_path(store);
            run_wizard(
                registry,
                store,
                Target::new(table, record),
                Verbosity::from_count(cli.verbose),
                format,
            )
        }
        Command::Validate { tokens } => run_validate(&resolve_registry(cli.registry)?, &tokens),
        Command::Describe => run_describe(&resolve_registry(cli.registry)?),
        Command::Schema => run_schema(),
    }
}

fn resolve_registry(path: Option<PathBuf>) -> CliResult<Registry> {
    let path = path.or_else(|| env::var_os(REGISTRY_ENV).map(PathBuf::from));
    let config_json = match &path {
        Some(path) => {
            debug!(path = %path.display(), "loading registry");
            let registry_json = fs::read_to_string(path)
                .map_err(|err| format!("failed to read registry {}: {}", path.display(), err))?;
            json!({ "registry_json": registry_json }).to_string()
        }
        None => String::new(),
    };
    Ok(load_registry(&config_json)?)
}

fn resolve_store_path(store: Option<PathBuf>) -> PathBuf {
    store
        .or_else(|| env::var_os(STORE_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE))
}

fn run_wizard(
    registry: Registry,
    store: PathBuf,
    target: Target,
    verbosity: Verbosity,
    format: RenderMode,
) -> CliResult<()> {
    info!(store = %store.display(), record = %target, "starting wizard");
    let mut component = OrderComponent::new(Arc::new(registry), JsonFileStore::new(store));
    let mut presenter = WizardPresenter::new(verbosity, format);

    presenter.show_header();
    let opened = component.focus(Some(target));
    presenter.show_response(&opened);
    presenter.show_form(&component.view());

    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Err("wizard input ended before the selection was saved".into());
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                presenter.show_parse_error(&err);
                continue;
            }
        };

        let response = match command {
            WizardCommand::Empty => continue,
            WizardCommand::Exit => return Err("wizard aborted by user".into()),
            WizardCommand::Show => {
                presenter.show_form(&component.view());
                continue;
            }
            WizardCommand::Set { group, values } => component.edit(&group, &values),
            WizardCommand::Submit => component.submit(),
            WizardCommand::Choose(token) => component.choose_secondary(&[token]),
            WizardCommand::Confirm(token) => component.confirm_secondary(token.as_deref()),
            WizardCommand::Back => component.cancel_secondary(),
            WizardCommand::Cancel => component.cancel(),
            WizardCommand::Focus(target) => component.focus(Some(target)),
        };
        presenter.show_response(&response);

        if let Some(tokens) = &response.committed {
            presenter.show_completion(tokens);
            return Ok(());
        }
        if response.phase == "done" {
            return if response.is_ok() {
                println!("Cancelled; nothing was saved.");
                Ok(())
            } else {
                Err("the selection was not saved".into())
            };
        }
        presenter.show_form(&component.view());
    }
}

fn run_validate(registry: &Registry, tokens: &[String]) -> CliResult<()> {
    let report = validate_report(registry, tokens);
    let (selection, _) = order_spec::normalize(registry, tokens);
    let outcome = validate(registry, &selection);

    println!(
        "Validation result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    if let Some(message) = outcome.message() {
        println!("{}", message);
    }
    describe_report(&report);

    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_report(report: &ValidationReport) {
    if !report.missing_required.is_empty() {
        println!("Missing required groups: {}", report.missing_required.join(", "));
    }
    if !report.unknown_tokens.is_empty() {
        println!("Unknown tokens: {}", report.unknown_tokens.join(", "));
    }
    if !report.conflicts.is_empty() {
        println!("Conflicting groups: {}", report.conflicts.join(", "));
    }
}

fn run_describe(registry: &Registry) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(registry)?);
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(Registry);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
