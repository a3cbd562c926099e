//! Ingest service - one rules document plus one transaction batch per call
//!
//! Inputs are decoded and the rules normalized before anything touches the
//! database. Everything after that runs inside a single unit of work, so a
//! failure leaves stored state exactly as it was.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{ProcessingSummary, RuleSet, RulesDocument, TransactionRow};
use crate::ports::LedgerStore;
use crate::services::classifier::classify_rows;
use crate::services::hierarchy::{upsert_rules, UpsertStats};
use crate::services::keyword_index::KeywordIndex;
use crate::services::parser::{RowFormat, RowParser};
use crate::services::{LogEvent, LoggingService};

/// Summary of one ingestion plus what the rules upsert changed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    #[serde(flatten)]
    pub summary: ProcessingSummary,
    pub rules: UpsertStats,
    /// Distinct lowercased keywords in the index used for this batch
    pub indexed_keywords: usize,
}

/// Run the pipeline against any store: upsert the hierarchy, build the
/// keyword index from `rules`, classify and persist `rows`.
pub fn ingest(
    store: &dyn LedgerStore,
    rules: &RuleSet,
    rows: &[TransactionRow],
    batch_id: Uuid,
) -> Result<IngestReport> {
    let upsert = upsert_rules(store, rules)?;
    let index = KeywordIndex::build(rules);
    tracing::debug!(keywords = index.len(), "keyword index built");

    let outcome = classify_rows(store, &index, rows, batch_id)?;

    Ok(IngestReport {
        summary: ProcessingSummary::new(batch_id, rows.len(), outcome.classified, outcome.duplicates),
        rules: upsert,
        indexed_keywords: index.len(),
    })
}

/// Reject missing, empty, oversized or wrongly-typed input files.
/// Returns the file size.
pub fn validate_input_file(path: &Path, allowed_extensions: &[&str], max_size: u64) -> Result<u64> {
    let name = path.display();
    let metadata = std::fs::metadata(path)
        .map_err(|_| Error::validation(format!("File not found: {}", name)))?;
    if !metadata.is_file() {
        return Err(Error::validation(format!("Not a file: {}", name)));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !allowed_extensions.contains(&extension.as_str()) {
        return Err(Error::validation(format!(
            "Unsupported file type for {} (expected {})",
            name,
            allowed_extensions.join(" or ")
        )));
    }

    let size = metadata.len();
    if size == 0 {
        return Err(Error::validation(format!("File is empty: {}", name)));
    }
    if size > max_size {
        return Err(Error::validation(format!(
            "File {} is {} bytes; the limit is {} bytes",
            name, size, max_size
        )));
    }
    Ok(size)
}

/// Ingest service over the DuckDB repository
pub struct IngestService {
    repository: Arc<DuckDbRepository>,
    config: Config,
    logger: Option<Arc<LoggingService>>,
}

impl IngestService {
    pub fn new(repository: Arc<DuckDbRepository>, config: Config) -> Self {
        Self {
            repository,
            config,
            logger: None,
        }
    }

    /// Record ingestion outcomes in the event log
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Validate and decode both files, then ingest them
    pub fn process_files(&self, rules_path: &Path, transactions_path: &Path) -> Result<IngestReport> {
        let result = self
            .load_files(rules_path, transactions_path)
            .and_then(|(rules, rows)| self.run(&rules, &rows));
        self.record(&result);
        result
    }

    /// Ingest an already decoded rules document and transaction rows
    pub fn process(
        &self,
        document: Option<RulesDocument>,
        rows: &[TransactionRow],
    ) -> Result<IngestReport> {
        let result = RuleSet::normalize(document).and_then(|rules| self.run(&rules, rows));
        self.record(&result);
        result
    }

    fn load_files(
        &self,
        rules_path: &Path,
        transactions_path: &Path,
    ) -> Result<(RuleSet, Vec<TransactionRow>)> {
        let max_size = self.config.max_file_size_bytes;
        validate_input_file(rules_path, &["json"], max_size)?;
        validate_input_file(transactions_path, &["csv", "json"], max_size)?;

        let rules_bytes = std::fs::read(rules_path)?;
        let rules_text = std::str::from_utf8(&rules_bytes)
            .map_err(|_| Error::invalid_rules("Rules document is not valid UTF-8"))?;
        let rules = RuleSet::from_json(rules_text)?;

        let format = transactions_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(RowFormat::from_extension)
            .unwrap_or(RowFormat::Csv);
        let bytes = std::fs::read(transactions_path)?;
        let rows = RowParser::from_config(&self.config).parse(format, &bytes)?;

        Ok((rules, rows))
    }

    fn run(&self, rules: &RuleSet, rows: &[TransactionRow]) -> Result<IngestReport> {
        let batch_id = Uuid::new_v4();
        tracing::info!(
            %batch_id,
            companies = rules.companies.len(),
            keywords = rules.keyword_count(),
            rows = rows.len(),
            "ingestion started"
        );

        // Dropping the unit of work on an early return rolls everything back
        let uow = self.repository.begin()?;
        let report = ingest(&uow, rules, rows, batch_id)?;
        uow.commit()?;

        Ok(report)
    }

    fn record(&self, result: &Result<IngestReport>) {
        let event = match result {
            Ok(report) => {
                tracing::info!(
                    batch_id = %report.summary.batch_id,
                    total = report.summary.total_transactions,
                    classified = report.summary.classified_transactions,
                    duplicates = report.summary.duplicates_skipped,
                    "ingestion completed"
                );
                LogEvent::new("ingestion_completed").with_summary(&report.summary)
            }
            Err(e) => {
                tracing::error!(error = %e, "ingestion failed");
                let kind = if e.is_client_error() { "client" } else { "internal" };
                LogEvent::new("ingestion_failed")
                    .with_error(e.to_string())
                    .with_error_details(kind)
            }
        };

        if let Some(logger) = &self.logger {
            if let Err(e) = logger.log(event) {
                tracing::warn!(error = %e, "could not write event log");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn rows() -> Vec<TransactionRow> {
        let at = |h| {
            NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        vec![
            TransactionRow {
                transaction_date: at(9),
                description: "Payroll April".to_string(),
                deposit_amount: 1000,
                withdrawal_amount: 0,
                balance_after: 1000,
                branch: None,
            },
            TransactionRow {
                transaction_date: at(10),
                description: "Grocery Store".to_string(),
                deposit_amount: 0,
                withdrawal_amount: 100,
                balance_after: 900,
                branch: None,
            },
        ]
    }

    fn rules() -> RuleSet {
        RuleSet::from_json(
            r#"{"companies": [{"company_id": "A", "company_name": "Alpha", "categories": [
                {"category_id": "C1", "category_name": "Pay", "keywords": ["pay"]}
            ]}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ingest_reports_counts() {
        let store = MemoryStore::new();
        let report = ingest(&store, &rules(), &rows(), Uuid::new_v4()).unwrap();

        assert_eq!(report.summary.total_transactions, 2);
        assert_eq!(report.summary.classified_transactions, 1);
        assert_eq!(report.summary.unclassified_transactions, 1);
        assert_eq!(report.rules.companies_created, 1);
        assert_eq!(report.indexed_keywords, 1);
        assert_eq!(
            report.summary.message,
            "Processing completed. 1/2 transactions classified."
        );
    }

    #[test]
    fn test_second_ingest_counts_duplicates_in_total() {
        let store = MemoryStore::new();
        ingest(&store, &rules(), &rows(), Uuid::new_v4()).unwrap();
        let second = ingest(&store, &rules(), &rows(), Uuid::new_v4()).unwrap();

        assert_eq!(second.summary.total_transactions, 2);
        assert_eq!(second.summary.duplicates_skipped, 2);
        assert_eq!(second.summary.classified_transactions, 0);
        assert_eq!(store.transactions().len(), 2);
    }

    #[test]
    fn test_report_serializes_flat_summary() {
        let store = MemoryStore::new();
        let report = ingest(&store, &rules(), &rows(), Uuid::new_v4()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalTransactions"], 2);
        assert_eq!(json["rules"]["keywordsInserted"], 1);
    }

    #[test]
    fn test_validate_input_file() {
        let dir = tempdir().unwrap();
        let rules = dir.path().join("rules.json");
        let empty = dir.path().join("empty.json");
        let text = dir.path().join("rules.txt");
        std::fs::write(&rules, "{}").unwrap();
        std::fs::write(&empty, "").unwrap();
        std::fs::write(&text, "{}").unwrap();

        assert_eq!(validate_input_file(&rules, &["json"], 100).unwrap(), 2);
        for (path, max) in [
            (dir.path().join("missing.json"), 100),
            (empty, 100),
            (text, 100),
            (rules, 1),
        ] {
            let err = validate_input_file(&path, &["json"], max).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{}", path.display());
        }
    }
}
