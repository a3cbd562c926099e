//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod company;
pub mod page;
pub mod report;
pub mod result;
pub mod rules;
mod transaction;

pub use company::{Category, CategoryView, Company, CompanyView, Keyword};
pub use page::{AccountingRecord, Page, PageRequest, SortDirection, SortField};
pub use report::{CompanyStatistics, ProcessingSummary};
pub use rules::{CategoryRules, CompanyRules, RuleSet, RulesDocument, SkippedCategory};
pub use transaction::{BankTransaction, Classification, DedupKey, TransactionRow};
