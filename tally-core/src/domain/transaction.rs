//! Bank transaction domain model

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One decoded ledger line from a bank export, before classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub transaction_date: NaiveDateTime,
    pub description: String,
    pub deposit_amount: i64,
    pub withdrawal_amount: i64,
    /// Account balance after this line was applied
    pub balance_after: i64,
    pub branch: Option<String>,
}

impl TransactionRow {
    pub fn dedup_key(&self) -> DedupKey<'_> {
        DedupKey {
            description: &self.description,
            transaction_date: self.transaction_date,
            balance_after: self.balance_after,
        }
    }
}

/// Identity of a real-world ledger event: two rows sharing these three
/// values are the same event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    pub description: &'a str,
    pub transaction_date: NaiveDateTime,
    pub balance_after: i64,
}

/// The (company, category) pair a transaction was assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub company_id: String,
    pub category_id: String,
}

/// A stored bank transaction. Immutable once inserted.
///
/// The classified flag is derived from `classification`, so it can never
/// disagree with the company/category links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Storage-assigned id; `None` until inserted
    pub id: Option<i64>,
    pub transaction_date: NaiveDateTime,
    pub description: String,
    pub deposit_amount: i64,
    pub withdrawal_amount: i64,
    pub balance_after: i64,
    pub branch: Option<String>,
    pub classification: Option<Classification>,
    /// Ingestion run that created this record
    pub batch_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl BankTransaction {
    /// Build an unclassified record from a decoded row
    pub fn from_row(row: &TransactionRow, batch_id: Uuid) -> Self {
        Self {
            id: None,
            transaction_date: row.transaction_date,
            description: row.description.clone(),
            deposit_amount: row.deposit_amount,
            withdrawal_amount: row.withdrawal_amount,
            balance_after: row.balance_after,
            branch: row.branch.clone(),
            classification: None,
            batch_id,
            created_at: Utc::now(),
        }
    }

    pub fn classify(&mut self, company_id: impl Into<String>, category_id: impl Into<String>) {
        self.classification = Some(Classification {
            company_id: company_id.into(),
            category_id: category_id.into(),
        });
    }

    pub fn is_classified(&self) -> bool {
        self.classification.is_some()
    }

    pub fn company_id(&self) -> Option<&str> {
        self.classification.as_ref().map(|c| c.company_id.as_str())
    }

    pub fn category_id(&self) -> Option<&str> {
        self.classification.as_ref().map(|c| c.category_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row() -> TransactionRow {
        TransactionRow {
            transaction_date: NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            description: "Payroll April".to_string(),
            deposit_amount: 1000,
            withdrawal_amount: 0,
            balance_after: 1000,
            branch: Some("Main".to_string()),
        }
    }

    #[test]
    fn test_from_row_is_unclassified() {
        let tx = BankTransaction::from_row(&row(), Uuid::new_v4());
        assert!(!tx.is_classified());
        assert!(tx.company_id().is_none());
        assert!(tx.category_id().is_none());
        assert!(tx.id.is_none());
    }

    #[test]
    fn test_classify_sets_both_links() {
        let mut tx = BankTransaction::from_row(&row(), Uuid::new_v4());
        tx.classify("A", "C1");
        assert!(tx.is_classified());
        assert_eq!(tx.company_id(), Some("A"));
        assert_eq!(tx.category_id(), Some("C1"));
    }

    #[test]
    fn test_dedup_key_ignores_amounts_and_branch() {
        let a = row();
        let mut b = row();
        b.deposit_amount = 5;
        b.branch = None;
        assert_eq!(a.dedup_key(), b.dedup_key());

        b.balance_after = 999;
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
