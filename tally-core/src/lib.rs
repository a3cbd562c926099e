//! Tally Core - keyword-based classification of bank transactions
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Company, Category, BankTransaction, rules)
//! - **ports**: Trait definitions for external dependencies (LedgerStore)
//! - **services**: Ingest pipeline, read services, event log, migrations
//! - **adapters**: Concrete implementations (DuckDB)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    AccountingRecord, BankTransaction, CompanyStatistics, CompanyView, Page, PageRequest,
    ProcessingSummary, RuleSet, RulesDocument, SortDirection, SortField, TransactionRow,
};
pub use domain::result::{Error, OperationResult};
pub use services::{IngestReport, LogEntry, LogEvent, LoggingService, UpsertStats};

/// Main context for Tally operations
///
/// Holds the configuration, the ledger database and the services built on it.
pub struct TallyContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub ingest_service: IngestService,
    pub record_service: RecordService,
    pub statistics_service: StatisticsService,
}

impl TallyContext {
    /// Open the tally directory, creating it and the ledger schema if needed
    pub fn new(tally_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(tally_dir)
            .with_context(|| format!("Failed to create {}", tally_dir.display()))?;
        let config = Config::load(tally_dir).context("Failed to load settings")?;

        let db_path = config.database_path(tally_dir);
        let repository = Arc::new(
            DuckDbRepository::new(&db_path)
                .with_context(|| format!("Failed to open {}", db_path.display()))?,
        );
        repository.ensure_schema().context("Failed to migrate ledger schema")?;

        let ingest_service = IngestService::new(Arc::clone(&repository), config.clone());
        let record_service = RecordService::new(Arc::clone(&repository), &config);
        let statistics_service = StatisticsService::new(Arc::clone(&repository));

        Ok(Self {
            config,
            repository,
            ingest_service,
            record_service,
            statistics_service,
        })
    }

    /// Record ingestion outcomes in the given event log
    pub fn with_event_log(mut self, logger: Arc<LoggingService>) -> Self {
        self.ingest_service =
            IngestService::new(Arc::clone(&self.repository), self.config.clone()).with_logger(logger);
        self
    }
}
