//! Paged record views

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::result::{Error, Result};

/// Sortable columns of the transaction listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    TransactionDate,
    Description,
    DepositAmount,
    WithdrawalAmount,
    BalanceAfter,
    Id,
}

impl SortField {
    /// Column name in the `bank_transactions` table
    pub fn column(&self) -> &'static str {
        match self {
            SortField::TransactionDate => "transaction_date",
            SortField::Description => "description",
            SortField::DepositAmount => "deposit_amount",
            SortField::WithdrawalAmount => "withdrawal_amount",
            SortField::BalanceAfter => "balance_after",
            SortField::Id => "id",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "transactionDate" | "transaction_date" => Ok(SortField::TransactionDate),
            "description" => Ok(SortField::Description),
            "depositAmount" | "deposit_amount" => Ok(SortField::DepositAmount),
            "withdrawalAmount" | "withdrawal_amount" => Ok(SortField::WithdrawalAmount),
            "balanceAfter" | "balance_after" => Ok(SortField::BalanceAfter),
            "id" => Ok(SortField::Id),
            other => Err(Error::validation(format!("Unknown sort field: '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Lenient parse: anything other than "asc" (any case) is descending
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Page request: zero-based page index and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort_by: SortField,
    pub direction: SortDirection,
}

impl PageRequest {
    /// Build a request, rejecting a zero size or one above `max_size`
    pub fn new(page: u32, size: u32, max_size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::validation("Page size must be at least 1"));
        }
        if size > max_size {
            return Err(Error::validation(format!(
                "Page size must not exceed {}",
                max_size
            )));
        }
        Ok(Self {
            page,
            size,
            sort_by: SortField::default(),
            direction: SortDirection::default(),
        })
    }

    pub fn sorted(mut self, sort_by: SortField, direction: SortDirection) -> Self {
        self.sort_by = sort_by;
        self.direction = direction;
        self
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = i64::from(request.size);
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: (total_elements + size - 1) / size,
        }
    }

    pub fn is_last(&self) -> bool {
        i64::from(self.page) + 1 >= self.total_pages
    }
}

/// Flattened view of a stored transaction with company/category names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingRecord {
    pub id: i64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub transaction_date: NaiveDateTime,
    pub description: String,
    pub deposit_amount: i64,
    pub withdrawal_amount: i64,
    pub balance_after: i64,
    pub branch: Option<String>,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub is_classified: bool,
}

fn serialize_timestamp<S: serde::Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(0, 0, 100).is_err());
        assert!(PageRequest::new(0, 101, 100).is_err());
        let req = PageRequest::new(2, 20, 100).unwrap();
        assert_eq!(req.offset(), 40);
        assert_eq!(req.limit(), 20);
        assert_eq!(req.sort_by, SortField::TransactionDate);
        assert_eq!(req.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("transactionDate".parse::<SortField>().unwrap(), SortField::TransactionDate);
        assert_eq!("balance_after".parse::<SortField>().unwrap(), SortField::BalanceAfter);
        assert!("drop table".parse::<SortField>().is_err());
    }

    #[test]
    fn test_sort_direction_is_lenient() {
        assert_eq!(SortDirection::parse("ASC"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Desc);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let req = PageRequest::new(0, 20, 100).unwrap();
        let page: Page<()> = Page::new(Vec::new(), &req, 41);
        assert_eq!(page.total_pages, 3);
        assert!(!page.is_last());

        let empty: Page<()> = Page::new(Vec::new(), &req, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.is_last());
    }
}
