//! In-memory ledger store for service unit tests

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::result::Result;
use crate::domain::{
    AccountingRecord, BankTransaction, Category, Company, DedupKey, Keyword, Page, PageRequest,
    SortDirection, SortField,
};
use crate::ports::LedgerStore;

#[derive(Default)]
struct State {
    companies: BTreeMap<String, Company>,
    categories: BTreeMap<String, Category>,
    keywords: Vec<Keyword>,
    transactions: Vec<BankTransaction>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> Vec<BankTransaction> {
        self.state.borrow().transactions.clone()
    }

    fn to_record(state: &State, tx: &BankTransaction) -> AccountingRecord {
        let company_name = tx
            .company_id()
            .and_then(|id| state.companies.get(id))
            .map(|c| c.company_name.clone());
        let category_name = tx
            .category_id()
            .and_then(|id| state.categories.get(id))
            .map(|c| c.category_name.clone());
        AccountingRecord {
            id: tx.id.unwrap_or_default(),
            transaction_date: tx.transaction_date,
            description: tx.description.clone(),
            deposit_amount: tx.deposit_amount,
            withdrawal_amount: tx.withdrawal_amount,
            balance_after: tx.balance_after,
            branch: tx.branch.clone(),
            company_id: tx.company_id().map(str::to_string),
            company_name,
            category_id: tx.category_id().map(str::to_string),
            category_name,
            is_classified: tx.is_classified(),
        }
    }

    fn page(
        &self,
        filter: impl Fn(&BankTransaction) -> bool,
        request: &PageRequest,
    ) -> Page<AccountingRecord> {
        let state = self.state.borrow();
        let mut records: Vec<AccountingRecord> = state
            .transactions
            .iter()
            .filter(|tx| filter(tx))
            .map(|tx| Self::to_record(&state, tx))
            .collect();

        records.sort_by(|a, b| {
            let ord = compare(a, b, request.sort_by).then(a.id.cmp(&b.id));
            match request.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = records.len() as i64;
        let content = records
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Page::new(content, request, total)
    }
}

fn compare(a: &AccountingRecord, b: &AccountingRecord, field: SortField) -> Ordering {
    match field {
        SortField::TransactionDate => a.transaction_date.cmp(&b.transaction_date),
        SortField::Description => a.description.cmp(&b.description),
        SortField::DepositAmount => a.deposit_amount.cmp(&b.deposit_amount),
        SortField::WithdrawalAmount => a.withdrawal_amount.cmp(&b.withdrawal_amount),
        SortField::BalanceAfter => a.balance_after.cmp(&b.balance_after),
        SortField::Id => a.id.cmp(&b.id),
    }
}

impl LedgerStore for MemoryStore {
    fn find_company(&self, company_id: &str) -> Result<Option<Company>> {
        Ok(self.state.borrow().companies.get(company_id).cloned())
    }

    fn upsert_company(&self, company: &Company) -> Result<()> {
        self.state
            .borrow_mut()
            .companies
            .insert(company.company_id.clone(), company.clone());
        Ok(())
    }

    fn list_companies(&self) -> Result<Vec<Company>> {
        Ok(self.state.borrow().companies.values().cloned().collect())
    }

    fn find_category(&self, category_id: &str) -> Result<Option<Category>> {
        Ok(self.state.borrow().categories.get(category_id).cloned())
    }

    fn upsert_category(&self, category: &Category) -> Result<()> {
        self.state
            .borrow_mut()
            .categories
            .insert(category.category_id.clone(), category.clone());
        Ok(())
    }

    fn list_categories_by_company(&self, company_id: &str) -> Result<Vec<Category>> {
        Ok(self
            .state
            .borrow()
            .categories
            .values()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect())
    }

    fn delete_keywords_by_category(&self, category_id: &str) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        let before = state.keywords.len();
        state.keywords.retain(|k| k.category_id != category_id);
        Ok(before - state.keywords.len())
    }

    fn insert_keyword(&self, keyword: &Keyword) -> Result<()> {
        self.state.borrow_mut().keywords.push(keyword.clone());
        Ok(())
    }

    fn list_keywords_by_category(&self, category_id: &str) -> Result<Vec<Keyword>> {
        Ok(self
            .state
            .borrow()
            .keywords
            .iter()
            .filter(|k| k.category_id == category_id)
            .cloned()
            .collect())
    }

    fn transaction_exists(&self, key: &DedupKey<'_>) -> Result<bool> {
        Ok(self.state.borrow().transactions.iter().any(|tx| {
            tx.description == key.description
                && tx.transaction_date == key.transaction_date
                && tx.balance_after == key.balance_after
        }))
    }

    fn insert_transaction(&self, tx: &BankTransaction) -> Result<i64> {
        let mut state = self.state.borrow_mut();
        let id = state.transactions.len() as i64 + 1;
        let mut stored = tx.clone();
        stored.id = Some(id);
        state.transactions.push(stored);
        Ok(id)
    }

    fn count_transactions_by_company(&self, company_id: &str) -> Result<i64> {
        Ok(self
            .state
            .borrow()
            .transactions
            .iter()
            .filter(|tx| tx.company_id() == Some(company_id))
            .count() as i64)
    }

    fn count_classified_transactions_by_company(&self, company_id: &str) -> Result<i64> {
        Ok(self
            .state
            .borrow()
            .transactions
            .iter()
            .filter(|tx| tx.is_classified() && tx.company_id() == Some(company_id))
            .count() as i64)
    }

    fn find_records_by_company(
        &self,
        company_id: &str,
        request: &PageRequest,
    ) -> Result<Page<AccountingRecord>> {
        Ok(self.page(|tx| tx.company_id() == Some(company_id), request))
    }

    fn find_unclassified_records(&self, request: &PageRequest) -> Result<Page<AccountingRecord>> {
        Ok(self.page(|tx| !tx.is_classified(), request))
    }
}
