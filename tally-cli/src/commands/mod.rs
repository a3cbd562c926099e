//! CLI command implementations

pub mod companies;
pub mod logs;
pub mod process;
pub mod records;
pub mod stats;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tally_core::{LogEvent, LoggingService, OperationResult, TallyContext};

/// Get the event log for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger(tally_dir: &Path) -> Option<Arc<LoggingService>> {
    std::fs::create_dir_all(tally_dir).ok()?;
    match LoggingService::new(tally_dir, env!("CARGO_PKG_VERSION")) {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            tracing::warn!(error = %e, "event log unavailable");
            None
        }
    }
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<Arc<LoggingService>>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            tracing::warn!(error = %e, "could not write event log");
        }
    }
}

/// Get the tally directory from TALLY_DIR or default to ~/.tally
pub fn get_tally_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TALLY_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".tally"))
        .ok_or_else(|| anyhow!("Could not find home directory; set TALLY_DIR"))
}

/// Open the tally context, wiring ingestion events into the event log
pub fn get_context(tally_dir: &Path, logger: Option<Arc<LoggingService>>) -> Result<TallyContext> {
    let ctx = TallyContext::new(tally_dir).context("Failed to initialize tally context")?;
    Ok(match logger {
        Some(logger) => ctx.with_event_log(logger),
        None => ctx,
    })
}

/// A core error whose JSON envelope has already been printed
#[derive(Debug)]
pub struct Reported(tally_core::Error);

impl Reported {
    pub fn is_client_error(&self) -> bool {
        self.0.is_client_error()
    }
}

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for Reported {}

/// Print a core result as an `OperationResult` envelope on stdout
pub fn emit_json<T: Serialize>(result: tally_core::domain::result::Result<T>) -> Result<()> {
    match result {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&OperationResult::ok(data))?);
            Ok(())
        }
        Err(e) => {
            let envelope = OperationResult::<T>::from_error(&e);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Err(Reported(e).into())
        }
    }
}
