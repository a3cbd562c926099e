//! Ingestion summary and per-company statistics

use serde::Serialize;
use uuid::Uuid;

/// Outcome of one ingestion call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSummary {
    pub batch_id: Uuid,
    /// Every parsed row, duplicates included
    pub total_transactions: usize,
    pub classified_transactions: usize,
    pub unclassified_transactions: usize,
    pub duplicates_skipped: usize,
    pub message: String,
}

impl ProcessingSummary {
    pub fn new(batch_id: Uuid, total: usize, classified: usize, duplicates: usize) -> Self {
        Self {
            batch_id,
            total_transactions: total,
            classified_transactions: classified,
            unclassified_transactions: total.saturating_sub(classified),
            duplicates_skipped: duplicates,
            message: format!(
                "Processing completed. {}/{} transactions classified.",
                classified, total
            ),
        }
    }
}

/// Classification counts for one company
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStatistics {
    pub company_id: String,
    pub total_transactions: i64,
    pub classified_transactions: i64,
    pub unclassified_transactions: i64,
    /// Percentage in [0, 100]; 0.0 when there are no transactions
    pub classification_rate: f64,
}

impl CompanyStatistics {
    pub fn new(company_id: impl Into<String>, total: i64, classified: i64) -> Self {
        let classification_rate = if total > 0 {
            classified as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            company_id: company_id.into(),
            total_transactions: total,
            classified_transactions: classified,
            unclassified_transactions: total - classified,
            classification_rate,
        }
    }
}
