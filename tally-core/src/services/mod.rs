//! Service layer - business logic orchestration
//!
//! The pipeline stages (hierarchy upsert, keyword index, classifier) work
//! against any `LedgerStore`. The services at the bottom bind them to the
//! DuckDB repository for callers.

pub mod classifier;
pub mod hierarchy;
pub mod ingest;
pub mod keyword_index;
pub mod logging;
pub mod migration;
pub mod parser;
mod records;
mod statistics;

pub use classifier::{classify_rows, ClassifyOutcome};
pub use hierarchy::{upsert_rules, UpsertStats};
pub use ingest::{ingest, validate_input_file, IngestReport, IngestService};
pub use keyword_index::{KeywordIndex, KeywordTarget};
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use parser::{parse_amount, RowFormat, RowParser};
pub use records::{find_records, list_catalogue, RecordService};
pub use statistics::{company_statistics, StatisticsService};
