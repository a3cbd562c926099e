//! Tally CLI - keyword-based bank transaction classification

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{companies, logs, process, records, stats, Reported};
use tally_core::LogEvent;

/// Tally - classify bank transactions by company and category
#[derive(Parser)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a rules document and a transaction export
    Process {
        /// Rules document (.json)
        rules: PathBuf,
        /// Bank transaction export (.csv or .json)
        transactions: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored transactions of a company (unclassified ones without --company)
    Records {
        /// Company ID
        #[arg(long, short)]
        company: Option<String>,
        #[command(flatten)]
        paging: records::PagingArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions that matched no keyword
    Unclassified {
        #[command(flatten)]
        paging: records::PagingArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show classification statistics for a company
    Stats {
        /// Company ID
        company_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List companies with their categories and keywords
    Companies {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Process { .. } => "process",
            Commands::Records { .. } => "records",
            Commands::Unclassified { .. } => "unclassified",
            Commands::Stats { .. } => "stats",
            Commands::Companies { .. } => "companies",
            Commands::Logs { .. } => "logs",
        }
    }
}

/// Diagnostics go to stderr; verbosity comes from TALLY_LOG (default "warn")
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Client faults (bad input, unknown company) exit 2, everything else 1
            let client_error = if let Some(reported) = e.downcast_ref::<Reported>() {
                reported.is_client_error()
            } else {
                output::error(&format!("{:#}", e));
                e.downcast_ref::<tally_core::Error>()
                    .map_or(false, |core| core.is_client_error())
            };
            if client_error {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let tally_dir = commands::get_tally_dir()?;
    let logger = commands::get_logger(&tally_dir);
    commands::log_event(
        &logger,
        LogEvent::new("command_executed").with_command(cli.command.name()),
    );

    match cli.command {
        Commands::Process {
            rules,
            transactions,
            json,
        } => process::run(&tally_dir, logger, &rules, &transactions, json),
        Commands::Records {
            company,
            paging,
            json,
        } => records::run(&tally_dir, logger, company.as_deref(), &paging, json),
        Commands::Unclassified { paging, json } => {
            records::run(&tally_dir, logger, None, &paging, json)
        }
        Commands::Stats { company_id, json } => stats::run(&tally_dir, logger, &company_id, json),
        Commands::Companies { json } => companies::run(&tally_dir, logger, json),
        Commands::Logs { command } => logs::run(logger, command),
    }
}
