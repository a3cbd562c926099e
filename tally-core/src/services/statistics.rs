//! Statistics service - per-company classification counts

use std::sync::Arc;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::CompanyStatistics;
use crate::ports::LedgerStore;

pub fn company_statistics(store: &dyn LedgerStore, company_id: &str) -> Result<CompanyStatistics> {
    if !store.company_exists(company_id)? {
        return Err(Error::UnknownCompany(company_id.to_string()));
    }
    let total = store.count_transactions_by_company(company_id)?;
    let classified = store.count_classified_transactions_by_company(company_id)?;
    Ok(CompanyStatistics::new(company_id, total, classified))
}

pub struct StatisticsService {
    repository: Arc<DuckDbRepository>,
}

impl StatisticsService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    pub fn company_statistics(&self, company_id: &str) -> Result<CompanyStatistics> {
        company_statistics(self.repository.as_ref(), company_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{BankTransaction, Company, TransactionRow};
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_zero_transactions_rate_is_zero() {
        let store = MemoryStore::new();
        store.upsert_company(&Company::new("A", "Alpha")).unwrap();

        let stats = company_statistics(&store, "A").unwrap();
        assert_eq!(stats.total_transactions, 0);
        assert_eq!(stats.classification_rate, 0.0);
    }

    #[test]
    fn test_unknown_company() {
        let err = company_statistics(&MemoryStore::new(), "nope").unwrap_err();
        assert!(matches!(err, Error::UnknownCompany(_)));
    }

    #[test]
    fn test_counts_only_that_company() {
        let store = MemoryStore::new();
        store.upsert_company(&Company::new("A", "Alpha")).unwrap();
        let row = TransactionRow {
            transaction_date: NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            description: "Payroll".to_string(),
            deposit_amount: 1,
            withdrawal_amount: 0,
            balance_after: 1,
            branch: None,
        };
        let mut tx = BankTransaction::from_row(&row, Uuid::new_v4());
        tx.classify("A", "C1");
        store.insert_transaction(&tx).unwrap();
        store
            .insert_transaction(&BankTransaction::from_row(&row, Uuid::new_v4()))
            .unwrap();

        let stats = company_statistics(&store, "A").unwrap();
        assert_eq!(stats.total_transactions, 1);
        assert_eq!(stats.classified_transactions, 1);
        assert_eq!(stats.classification_rate, 100.0);
    }
}
