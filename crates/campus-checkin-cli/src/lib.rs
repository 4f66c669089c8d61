#![forbid(unsafe_code)]

mod command_dispatch;
mod commands;
mod helpers;
mod scan_console;

use campus_checkin_core::{ExitCode, MachineError};
use campus_checkin_server::{CheckinError, RegistrationError};
use campus_checkin_store::StoreError;
use clap::{error::ErrorKind, ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use commands::Commands;

#[derive(Parser)]
#[command(name = "campus-checkin")]
#[command(about = "Campus event registration and door check-in")]
#[command(
    after_help = "Environment:\n  CHECKIN_DB_PATH          Ledger database (default campus-checkin.sqlite)\n  CHECKIN_TICKET_SECRET    Ticket signing key\n  RUST_LOG                 Log filter"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Ledger database path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    pub json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    let command = cli.command.ok_or_else(|| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new("usage_error", "missing command; see --help"),
    })?;
    init_logging(cli.verbose);

    let output_mode = OutputMode { json: cli.json };
    let db_path = cli.db.unwrap_or_else(campus_checkin_core::resolve_db_path);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {e}")))?;
    runtime.block_on(command_dispatch::run_command(command, &db_path, output_mode))
}

/// Logs go to stderr so stdout stays machine readable.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug)]
pub(crate) struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    pub(crate) fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", &message),
        }
    }

    pub(crate) fn dependency(message: String) -> Self {
        Self {
            exit_code: ExitCode::DependencyFailure,
            machine: MachineError::new("dependency_failure", &message),
        }
    }

    pub(crate) fn validation(message: String) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new("validation_error", &message),
        }
    }

    pub(crate) fn rejected(code: &str, message: String) -> Self {
        Self {
            exit_code: ExitCode::Rejected,
            machine: MachineError::new(code, &message),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::dependency(err.to_string()).with_detail("store_code", err.code.as_str())
    }
}

impl From<RegistrationError> for CliError {
    fn from(err: RegistrationError) -> Self {
        let message = err.to_string();
        match err {
            RegistrationError::EventNotFound(_) => Self::rejected("event_not_found", message),
            RegistrationError::EventClosed(_) => Self::rejected("event_closed", message),
            RegistrationError::ProfileNotFound(_) => Self::rejected("profile_not_found", message),
            RegistrationError::DuplicateRegistration { .. } => {
                Self::rejected("duplicate_registration", message)
            }
            RegistrationError::NotRegistered { .. } => {
                Self::rejected("registration_not_found", message)
            }
            RegistrationError::TicketEncoding(_) => Self::internal(message),
            _ => Self::dependency(message),
        }
    }
}

impl From<CheckinError> for CliError {
    fn from(err: CheckinError) -> Self {
        match err {
            CheckinError::Unauthorized { .. } => Self::rejected("forbidden", err.to_string()),
            other => Self::dependency(other.to_string()),
        }
    }
}

impl CliError {
    fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.machine = self.machine.with_detail(key, value);
        self
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine.message);
    }
}
