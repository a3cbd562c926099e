//! Record service - paged transaction listings and the company catalogue

use std::sync::Arc;

use crate::adapters::duckdb::DuckDbRepository;
use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountingRecord, CategoryView, CompanyView, Page, PageRequest, SortDirection, SortField,
};
use crate::ports::LedgerStore;

/// Transactions of `company_id`, or the unclassified ones when it is absent
/// or blank. Naming a company that is not stored is `UnknownCompany`.
pub fn find_records(
    store: &dyn LedgerStore,
    company_id: Option<&str>,
    request: &PageRequest,
) -> Result<Page<AccountingRecord>> {
    match company_id.map(str::trim).filter(|id| !id.is_empty()) {
        None => store.find_unclassified_records(request),
        Some(id) => {
            if !store.company_exists(id)? {
                return Err(Error::UnknownCompany(id.to_string()));
            }
            store.find_records_by_company(id, request)
        }
    }
}

/// Every company with its categories and their keywords
pub fn list_catalogue(store: &dyn LedgerStore) -> Result<Vec<CompanyView>> {
    let mut views = Vec::new();
    for company in store.list_companies()? {
        let mut categories = Vec::new();
        for category in store.list_categories_by_company(&company.company_id)? {
            let keywords = store
                .list_keywords_by_category(&category.category_id)?
                .into_iter()
                .map(|k| k.keyword)
                .collect();
            categories.push(CategoryView {
                category_id: category.category_id,
                category_name: category.category_name,
                keywords,
                created_at: category.created_at,
                updated_at: category.updated_at,
            });
        }
        views.push(CompanyView {
            company_id: company.company_id,
            company_name: company.company_name,
            categories,
            created_at: company.created_at,
            updated_at: company.updated_at,
        });
    }
    Ok(views)
}

/// Read-side service over the DuckDB repository
pub struct RecordService {
    repository: Arc<DuckDbRepository>,
    default_page_size: u32,
    max_page_size: u32,
}

impl RecordService {
    pub fn new(repository: Arc<DuckDbRepository>, config: &Config) -> Self {
        Self {
            repository,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// Build a page request, applying the configured default and maximum size
    pub fn page_request(
        &self,
        page: u32,
        size: Option<u32>,
        sort_by: SortField,
        direction: SortDirection,
    ) -> Result<PageRequest> {
        let size = size.unwrap_or(self.default_page_size);
        Ok(PageRequest::new(page, size, self.max_page_size)?.sorted(sort_by, direction))
    }

    pub fn records(
        &self,
        company_id: Option<&str>,
        request: &PageRequest,
    ) -> Result<Page<AccountingRecord>> {
        find_records(self.repository.as_ref(), company_id, request)
    }

    pub fn unclassified(&self, request: &PageRequest) -> Result<Page<AccountingRecord>> {
        find_records(self.repository.as_ref(), None, request)
    }

    pub fn companies(&self) -> Result<Vec<CompanyView>> {
        list_catalogue(self.repository.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{BankTransaction, Category, Company, Keyword, TransactionRow};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.upsert_company(&Company::new("B", "Beta")).unwrap();
        store.upsert_company(&Company::new("A", "Alpha")).unwrap();
        store.upsert_category(&Category::new("C2", "Food", "A")).unwrap();
        store.upsert_category(&Category::new("C1", "Pay", "A")).unwrap();
        store.insert_keyword(&Keyword::new("salary", "C1")).unwrap();
        store.insert_keyword(&Keyword::new("pay", "C1")).unwrap();

        for (i, classified) in [true, false, true].into_iter().enumerate() {
            let row = TransactionRow {
                transaction_date: NaiveDate::from_ymd_opt(2024, 4, 1 + i as u32)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
                description: format!("row {}", i),
                deposit_amount: 0,
                withdrawal_amount: 0,
                balance_after: i as i64,
                branch: None,
            };
            let mut tx = BankTransaction::from_row(&row, Uuid::new_v4());
            if classified {
                tx.classify("A", "C1");
            }
            store.insert_transaction(&tx).unwrap();
        }
        store
    }

    fn request() -> PageRequest {
        PageRequest::new(0, 10, 100).unwrap()
    }

    #[test]
    fn test_blank_company_lists_unclassified() {
        let store = store();
        for company in [None, Some(""), Some("  ")] {
            let page = find_records(&store, company, &request()).unwrap();
            assert_eq!(page.total_elements, 1);
            assert!(!page.content[0].is_classified);
        }
    }

    #[test]
    fn test_company_records_with_names() {
        let page = find_records(&store(), Some("A"), &request()).unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.content[0].description, "row 2");
        assert_eq!(page.content[0].category_name.as_deref(), Some("Pay"));
    }

    #[test]
    fn test_unknown_company_is_error() {
        let err = find_records(&store(), Some("Z"), &request()).unwrap_err();
        assert!(matches!(err, Error::UnknownCompany(ref id) if id == "Z"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_catalogue_ordering() {
        let catalogue = list_catalogue(&store()).unwrap();
        let ids: Vec<&str> = catalogue.iter().map(|c| c.company_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        let alpha = &catalogue[0];
        assert_eq!(alpha.categories[0].category_id, "C1");
        assert_eq!(alpha.categories[0].keywords, vec!["salary", "pay"]);
        assert!(catalogue[1].categories.is_empty());
    }
}
