//! Command-line front end for the stackfx filter catalogue.
//!
//! The runtime loads layered configuration, installs telemetry, runs
//! discovery over the configured plugin root, and executes one command. It is
//! exercised both from the binary entrypoint and from tests where the
//! configuration loader and IO streams are substituted.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use stackfx_filters::FilterError;
use thiserror::Error;

mod catalogue;
mod config;
pub mod telemetry;

use catalogue::{Catalogue, ListOptions};
use config::split_config_arguments;
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use telemetry::TelemetryError;

/// CLI flags recognised by the configuration loader.
///
/// Keep in sync with the fields of `stackfx_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--plugin-root",
    "--settings-path",
    "--backend-services",
    "--log-filter",
    "--log-format",
];

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    match execute(&arguments, stdout, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W, L>(args: &[OsString], stdout: &mut W, loader: &L) -> Result<(), AppError>
where
    W: Write,
    L: ConfigLoader,
{
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(&split.command_arguments).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config).map_err(AppError::Telemetry)?;

    let catalogue = Catalogue::discover(&config)?;
    match cli.command {
        CliCommand::List(list) => catalogue.write_list(&list.into(), stdout),
        CliCommand::Skipped { json } => catalogue.write_skipped(json, stdout),
        CliCommand::Attach { filters } => catalogue.write_attached(&filters, stdout),
    }
}

#[derive(Parser, Debug)]
#[command(name = "stackfx", disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Lists discovered filters.
    List(ListArgs),
    /// Lists descriptor files that discovery skipped, with the reason.
    Skipped {
        /// Emits JSON instead of one line per file.
        #[arg(long)]
        json: bool,
    },
    /// Attaches filters to an empty in-memory producer and prints the chain.
    Attach {
        /// Unique ids of the filters, in attach order.
        #[arg(value_name = "ID", required = true)]
        filters: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Includes hidden filters.
    #[arg(long)]
    all: bool,
    /// Only lists filters marked as favourites.
    #[arg(long)]
    favorites: bool,
    /// Only lists filters whose name or keywords contain QUERY.
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,
    /// Emits JSON instead of one line per filter.
    #[arg(long)]
    json: bool,
}

impl From<ListArgs> for ListOptions {
    fn from(args: ListArgs) -> Self {
        Self {
            all: args.all,
            favorites: args.favorites,
            search: args.search,
            json: args.json,
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(TelemetryError),
    #[error(transparent)]
    Filters(#[from] FilterError),
    #[error("failed to serialise output: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(io::Error),
}
