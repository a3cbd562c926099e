//! Ledger store port - storage abstraction consumed by the services

use crate::domain::result::Result;
use crate::domain::{
    AccountingRecord, BankTransaction, Category, Company, DedupKey, Keyword, Page, PageRequest,
};

/// Storage contract for companies, categories, keywords and transactions.
///
/// Implemented by the DuckDB repository (auto-commit per call) and by its
/// unit of work (all calls inside one database transaction). The ingest
/// pipeline only sees this trait, so it does not know which one it got.
pub trait LedgerStore {
    // === Companies ===

    fn find_company(&self, company_id: &str) -> Result<Option<Company>>;

    /// Insert or overwrite by `company_id`
    fn upsert_company(&self, company: &Company) -> Result<()>;

    fn company_exists(&self, company_id: &str) -> Result<bool> {
        Ok(self.find_company(company_id)?.is_some())
    }

    /// All companies ordered by id
    fn list_companies(&self) -> Result<Vec<Company>>;

    // === Categories ===

    /// Look up a category by its globally unique id
    fn find_category(&self, category_id: &str) -> Result<Option<Category>>;

    /// Insert or overwrite by `category_id` (name and owning company)
    fn upsert_category(&self, category: &Category) -> Result<()>;

    /// Categories owned by a company, ordered by id
    fn list_categories_by_company(&self, company_id: &str) -> Result<Vec<Category>>;

    // === Keywords ===

    /// Remove every keyword of a category; returns how many were removed
    fn delete_keywords_by_category(&self, category_id: &str) -> Result<usize>;

    fn insert_keyword(&self, keyword: &Keyword) -> Result<()>;

    /// Keywords of a category in insertion order
    fn list_keywords_by_category(&self, category_id: &str) -> Result<Vec<Keyword>>;

    // === Transactions ===

    fn transaction_exists(&self, key: &DedupKey<'_>) -> Result<bool>;

    /// Persist a new transaction; returns the assigned id
    fn insert_transaction(&self, tx: &BankTransaction) -> Result<i64>;

    fn count_transactions_by_company(&self, company_id: &str) -> Result<i64>;

    fn count_classified_transactions_by_company(&self, company_id: &str) -> Result<i64>;

    fn find_records_by_company(
        &self,
        company_id: &str,
        request: &PageRequest,
    ) -> Result<Page<AccountingRecord>>;

    fn find_unclassified_records(&self, request: &PageRequest) -> Result<Page<AccountingRecord>>;
}
