//! Company / category / keyword domain models
//!
//! Companies and categories are addressed by their external ids. Keywords are
//! plain value records that point at their owning category by id; nothing
//! holds a back-reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A company declared in a rules document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// External, stable identity key
    pub company_id: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(company_id: impl Into<String>, company_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            company_id: company_id.into(),
            company_name: company_name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the display name, bumping `updated_at`
    pub fn rename(&mut self, company_name: &str) {
        self.company_name = company_name.to_string();
        self.updated_at = Utc::now();
    }
}

/// A category; its id is unique across all companies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,
    pub category_name: String,
    /// Owning company (may move between ingestions)
    pub company_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        category_id: impl Into<String>,
        category_name: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            category_id: category_id.into(),
            category_name: category_name.into(),
            company_id: company_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite name and owning company, bumping `updated_at`
    pub fn reassign(&mut self, category_name: &str, company_id: &str) {
        self.category_name = category_name.to_string();
        self.company_id = company_id.to_string();
        self.updated_at = Utc::now();
    }
}

/// A keyword belonging to one category. The same text may exist under
/// several categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub category_id: String,
}

impl Keyword {
    pub fn new(keyword: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category_id: category_id.into(),
        }
    }
}

/// Category with its keywords, for catalogue listings
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub category_id: String,
    pub category_name: String,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company with its categories, for catalogue listings
#[derive(Debug, Clone, Serialize)]
pub struct CompanyView {
    pub company_id: String,
    pub company_name: String,
    pub categories: Vec<CategoryView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
