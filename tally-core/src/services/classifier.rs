//! Transaction classifier - dedup, keyword match, persist

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{BankTransaction, TransactionRow};
use crate::ports::LedgerStore;
use crate::services::keyword_index::KeywordIndex;

/// Counts from one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOutcome {
    /// Rows persisted (classified or not)
    pub inserted: usize,
    pub classified: usize,
    /// Rows skipped because an identical event was already stored
    pub duplicates: usize,
}

/// Classify and store `rows` in input order.
///
/// Duplicates (same description, timestamp and balance) are skipped,
/// including rows repeated earlier in the same batch. A keyword match whose
/// company or category is not stored leaves the transaction unclassified.
pub fn classify_rows(
    store: &dyn LedgerStore,
    index: &KeywordIndex,
    rows: &[TransactionRow],
    batch_id: Uuid,
) -> Result<ClassifyOutcome> {
    let mut outcome = ClassifyOutcome::default();

    for row in rows {
        if store.transaction_exists(&row.dedup_key())? {
            tracing::debug!(date = %row.transaction_date, "duplicate transaction skipped");
            outcome.duplicates += 1;
            continue;
        }

        let mut tx = BankTransaction::from_row(row, batch_id);

        if let Some((keyword, target)) = index.find_best_match(&row.description) {
            let company = store.find_company(&target.company_id)?;
            let category = store.find_category(&target.category_id)?;
            match (company, category) {
                (Some(company), Some(category)) => {
                    tx.classify(company.company_id, category.category_id);
                }
                _ => {
                    tracing::warn!(
                        keyword = %keyword,
                        company_id = %target.company_id,
                        category_id = %target.category_id,
                        "keyword matched but its company or category is not stored"
                    );
                }
            }
        }

        if tx.is_classified() {
            outcome.classified += 1;
        }
        store.insert_transaction(&tx)?;
        outcome.inserted += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{Category, Company, RuleSet};
    use chrono::NaiveDate;

    fn row(description: &str, day: u32, balance: i64) -> TransactionRow {
        TransactionRow {
            transaction_date: NaiveDate::from_ymd_opt(2024, 4, day)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            description: description.to_string(),
            deposit_amount: 0,
            withdrawal_amount: 0,
            balance_after: balance,
            branch: None,
        }
    }

    fn setup() -> (MemoryStore, KeywordIndex) {
        let rules = RuleSet::from_json(
            r#"{"companies": [{"company_id": "A", "company_name": "Alpha", "categories": [
                {"category_id": "C1", "category_name": "Pay", "keywords": ["pay"]}
            ]}]}"#,
        )
        .unwrap();
        let store = MemoryStore::new();
        store.upsert_company(&Company::new("A", "Alpha")).unwrap();
        store.upsert_category(&Category::new("C1", "Pay", "A")).unwrap();
        (store, KeywordIndex::build(&rules))
    }

    #[test]
    fn test_classifies_matching_and_leaves_others() {
        let (store, index) = setup();
        let rows = vec![row("Payroll April", 1, 1000), row("Grocery Store", 2, 900)];

        let outcome = classify_rows(&store, &index, &rows, Uuid::new_v4()).unwrap();
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.classified, 1);

        let stored = store.transactions();
        assert_eq!(stored[0].company_id(), Some("A"));
        assert_eq!(stored[0].category_id(), Some("C1"));
        assert!(!stored[1].is_classified());
        assert!(stored[1].company_id().is_none());
    }

    #[test]
    fn test_duplicates_within_batch_are_skipped() {
        let (store, index) = setup();
        let rows = vec![row("Payroll", 1, 1000), row("Payroll", 1, 1000)];

        let outcome = classify_rows(&store, &index, &rows, Uuid::new_v4()).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.classified, 1);
    }

    #[test]
    fn test_unresolved_target_stays_unclassified() {
        let rules = RuleSet::from_json(
            r#"{"companies": [{"company_id": "Z", "company_name": "Ghost", "categories": [
                {"category_id": "CZ", "category_name": "Ghost", "keywords": ["pay"]}
            ]}]}"#,
        )
        .unwrap();
        let store = MemoryStore::new();
        let index = KeywordIndex::build(&rules);

        let outcome =
            classify_rows(&store, &index, &[row("Payroll", 1, 1000)], Uuid::new_v4()).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.classified, 0);
        assert!(!store.transactions()[0].is_classified());
    }

    #[test]
    fn test_batch_id_stamped_on_every_record() {
        let (store, index) = setup();
        let batch_id = Uuid::new_v4();
        classify_rows(&store, &index, &[row("a", 1, 1), row("b", 2, 2)], batch_id).unwrap();
        assert!(store.transactions().iter().all(|t| t.batch_id == batch_id));
    }
}
