mod commands;
mod helpers;

use clap::Parser;
use nuresp_core::domain::NurespError;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_nuresp_error();
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("nuresp".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose);
            dispatch_parsed(cli.config, cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "nuresp",
    version,
    about = "Neutrino detector-response conversion tables"
)]
struct Cli {
    /// JSON run configuration; built-in IceCube defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Build conversion tables for every configured year and store them
    Build(commands::BuildArgs),
    /// Summarize one year's conversion table or print a single cell
    Inspect(commands::InspectArgs),
    /// Report per-year livetime from the uptime tables
    Livetime,
    /// Summarize the per-year event tables
    DataSummary,
}

fn dispatch_parsed(config: Option<PathBuf>, command: CliCommand) -> Result<i32, CliError> {
    let config = helpers::load_run_config(config.as_deref())?;
    match command {
        CliCommand::Build(args) => commands::run_build_command(config, args),
        CliCommand::Inspect(args) => commands::run_inspect_command(config, args),
        CliCommand::Livetime => commands::run_livetime_command(config),
        CliCommand::DataSummary => commands::run_data_summary_command(config),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(NurespError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_nuresp_error(&self) -> NurespError {
        match self {
            Self::Usage(message) => {
                NurespError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => NurespError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}
