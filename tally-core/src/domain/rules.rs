//! Rules document and its normalized form
//!
//! The raw document mirrors the JSON a user writes. Every field is optional
//! at this level so that missing values surface as domain errors instead of
//! decode errors. `RuleSet::normalize` turns it into the validated
//! company → category → keyword tree that the rest of the engine consumes.

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Raw rules document as decoded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesDocument {
    #[serde(default)]
    pub companies: Option<Vec<CompanyRule>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyRule {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryRule>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<Option<String>>>,
}

/// Validated category with trimmed, non-blank keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRules {
    pub category_id: String,
    pub category_name: String,
    pub keywords: Vec<String>,
}

/// Validated company and the categories that survived normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRules {
    pub company_id: String,
    pub company_name: String,
    pub categories: Vec<CategoryRules>,
}

/// A category entry dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCategory {
    pub company_id: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub reason: String,
}

/// Normalized rules tree, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub companies: Vec<CompanyRules>,
    pub skipped: Vec<SkippedCategory>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl RuleSet {
    /// Decode a rules JSON document and normalize it.
    ///
    /// A JSON `null` document counts as absent.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Option<RulesDocument> = serde_json::from_str(json)
            .map_err(|e| Error::invalid_rules(format!("Rules document is not valid JSON: {}", e)))?;
        Self::normalize(document)
    }

    /// Validate a raw document.
    ///
    /// Company-level defects abort with `InvalidRules`. Category-level defects
    /// only drop that category (recorded in `skipped`). Blank keywords are
    /// dropped and the rest trimmed.
    pub fn normalize(document: Option<RulesDocument>) -> Result<Self> {
        let companies = document
            .and_then(|d| d.companies)
            .ok_or_else(|| Error::invalid_rules("Rules data is invalid or empty"))?;

        let mut rule_set = RuleSet::default();

        for company in companies {
            if is_blank(&company.company_id) {
                tracing::error!(
                    company_name = company.company_name.as_deref().unwrap_or_default(),
                    "company id is blank"
                );
                return Err(Error::invalid_rules("Company ID cannot be null or empty"));
            }
            if is_blank(&company.company_name) {
                tracing::error!(
                    company_id = company.company_id.as_deref().unwrap_or_default(),
                    "company name is blank"
                );
                return Err(Error::invalid_rules(format!(
                    "Company name cannot be null or empty (company {})",
                    company.company_id.as_deref().unwrap_or_default()
                )));
            }

            // Both checked non-blank above
            let company_id = company.company_id.unwrap_or_default();
            let company_name = company.company_name.unwrap_or_default();

            let mut categories = Vec::new();
            for category in company.categories.unwrap_or_default() {
                let reason = if is_blank(&category.category_id) {
                    Some("category id is blank")
                } else if is_blank(&category.category_name) {
                    Some("category name is blank")
                } else {
                    None
                };

                if let Some(reason) = reason {
                    tracing::warn!(
                        company_id = %company_id,
                        category_id = category.category_id.as_deref().unwrap_or_default(),
                        category_name = category.category_name.as_deref().unwrap_or_default(),
                        "skipping category: {}",
                        reason
                    );
                    rule_set.skipped.push(SkippedCategory {
                        company_id: company_id.clone(),
                        category_id: category.category_id,
                        category_name: category.category_name,
                        reason: reason.to_string(),
                    });
                    continue;
                }

                let keywords = category
                    .keywords
                    .unwrap_or_default()
                    .into_iter()
                    .flatten()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();

                categories.push(CategoryRules {
                    category_id: category.category_id.unwrap_or_default(),
                    category_name: category.category_name.unwrap_or_default(),
                    keywords,
                });
            }

            rule_set.companies.push(CompanyRules {
                company_id,
                company_name,
                categories,
            });
        }

        Ok(rule_set)
    }

    /// Iterate (company, category) pairs in document order
    pub fn categories(&self) -> impl Iterator<Item = (&CompanyRules, &CategoryRules)> {
        self.companies
            .iter()
            .flat_map(|company| company.categories.iter().map(move |cat| (company, cat)))
    }

    pub fn keyword_count(&self) -> usize {
        self.categories().map(|(_, cat)| cat.keywords.len()).sum()
    }
}
