use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{self, ConfigError};
use crate::contract::ScriptFilterOutput;
use crate::core_service::{CoreService, ServiceError};
use crate::logging;
use crate::presenter::{attach_task_id, render_reschedule_menu, Presenter};
use crate::search::QueryMode;
use crate::session::SessionContext;
use crate::transport::{self, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("invalid session variables: {0}")]
    Session(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("no task id given to edit")]
    MissingTaskId,
}

#[derive(Debug, Parser)]
#[command(name = "tasklens", about = "Launcher script filter for to-do queries")]
pub struct CliOptions {
    /// Config file (toml, or json5 by extension)
    #[arg(long, global = true, env = "TASKLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Variables bag handed back from the previous result item
    #[arg(long, global = true)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Filter tasks, autocompleting labels/projects as you type
    Query {
        #[arg(value_parser = parse_mode)]
        mode: QueryMode,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },
    /// Preview a task about to be created
    New {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },
    /// Preview replacing an existing task with a new-task line
    Edit {
        /// Task to edit; defaults to the session's task id
        #[arg(long)]
        task_id: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },
    /// Offer new due dates for an existing task
    Reschedule {
        content: String,
        spec: Option<String>,
    },
    /// Print label and project frequency tables
    Counts,
}

fn parse_mode(value: &str) -> Result<QueryMode, String> {
    QueryMode::parse(value).ok_or_else(|| format!("unknown mode '{value}'"))
}

pub fn parse_cli_args(args: &[String]) -> Result<CliOptions, clap::Error> {
    CliOptions::try_parse_from(std::iter::once("tasklens").chain(args.iter().map(String::as_str)))
}

pub fn run_with_options(options: CliOptions) -> Result<(), RuntimeError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_writer(options, &mut out)
}

/// Runs one invocation, writing launcher JSON to `out`.
///
/// Failures still leave one well-formed error item on `out` before the error
/// is returned.
pub fn run_with_writer(options: CliOptions, out: &mut impl Write) -> Result<(), RuntimeError> {
    let config = match config::load(options.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            write_output(out, &transport::error_output(ErrorCode::Config, error.to_string()))?;
            return Err(error.into());
        }
    };

    if let Err(error) = logging::init(&config.data_dir) {
        eprintln!("[tasklens] logging disabled: {error}");
    }

    let session = match SessionContext::decode(options.session.as_deref().unwrap_or_default()) {
        Ok(session) => session,
        Err(error) => {
            log::warn!("rejecting session variables: {error}");
            write_output(
                out,
                &transport::error_output(ErrorCode::InvalidSession, error.to_string()),
            )?;
            return Err(error.into());
        }
    };

    let service = match CoreService::new(config) {
        Ok(service) => service,
        Err(error) => {
            log::error!("{error}");
            write_output(out, &transport::service_error_output(&error))?;
            return Err(error.into());
        }
    };

    let presenter = Presenter {
        catalog: service.catalog(),
        today: service.today(),
        task_open: service.config().task_open,
    };

    match options.command {
        Command::Query { mode, input } => {
            let input = effective_input(&input, &session);
            log::info!("query mode={mode} input='{input}'");
            let outcome = service.query(mode, &input);
            write_output(out, &presenter.render(&outcome))?;
        }
        Command::New { input } => {
            let input = effective_input(&input, &session);
            log::info!("new task input='{input}'");
            let outcome = service.draft_task(&input);
            write_output(out, &presenter.render(&outcome))?;
        }
        Command::Edit { task_id, input } => {
            let Some(task_id) = task_id.or_else(|| session.task_id.clone()) else {
                log::warn!("edit invoked without a task id");
                write_output(
                    out,
                    &transport::error_output(ErrorCode::MissingTaskId, "pick a task to edit first"),
                )?;
                return Err(RuntimeError::MissingTaskId);
            };
            let input = effective_input(&input, &session);
            log::info!("edit task={task_id} input='{input}'");
            let outcome = service.draft_edit(&task_id, &input);
            write_output(out, &attach_task_id(presenter.render(&outcome), &task_id))?;
        }
        Command::Reschedule { content, spec } => {
            let entries = service.reschedule_menu(&content, spec.as_deref().unwrap_or_default());
            let output =
                render_reschedule_menu(session.task_id.as_deref(), &entries, service.today());
            write_output(out, &output)?;
        }
        Command::Counts => {
            writeln!(out, "{}", transport::counts_json(service.catalog()))?;
        }
    }
    Ok(())
}

/// Typed input wins; an empty line replays the query an iterate item set.
fn effective_input(args: &[String], session: &SessionContext) -> String {
    let typed = args.join(" ");
    if typed.trim().is_empty() && session.iterate {
        return session.query.clone().unwrap_or_default();
    }
    typed
}

fn write_output(out: &mut impl Write, output: &ScriptFilterOutput) -> Result<(), std::io::Error> {
    writeln!(out, "{}", transport::output_json(output))?;
    out.flush()
}
