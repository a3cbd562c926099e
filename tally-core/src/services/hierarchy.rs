//! Hierarchy upsert - reconciles a normalized rule set with stored state

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Category, Company, Keyword, RuleSet};
use crate::ports::LedgerStore;

/// What one upsert pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertStats {
    pub companies_created: usize,
    pub companies_updated: usize,
    pub categories_created: usize,
    pub categories_updated: usize,
    pub categories_skipped: usize,
    pub keywords_removed: usize,
    pub keywords_inserted: usize,
}

/// Create-or-update every company and category of `rules`, then replace each
/// category's keyword set wholesale.
///
/// Any storage error aborts the pass; the caller's unit of work decides
/// whether earlier writes survive.
pub fn upsert_rules(store: &dyn LedgerStore, rules: &RuleSet) -> Result<UpsertStats> {
    let mut stats = UpsertStats {
        categories_skipped: rules.skipped.len(),
        ..UpsertStats::default()
    };

    for company_rules in &rules.companies {
        let company = match store.find_company(&company_rules.company_id)? {
            Some(mut existing) => {
                existing.rename(&company_rules.company_name);
                stats.companies_updated += 1;
                existing
            }
            None => {
                stats.companies_created += 1;
                Company::new(&company_rules.company_id, &company_rules.company_name)
            }
        };
        store.upsert_company(&company)?;
        tracing::info!(
            company_id = %company.company_id,
            categories = company_rules.categories.len(),
            "company upserted"
        );

        for category_rules in &company_rules.categories {
            let category = match store.find_category(&category_rules.category_id)? {
                Some(mut existing) => {
                    if existing.company_id != company.company_id {
                        tracing::info!(
                            category_id = %existing.category_id,
                            from = %existing.company_id,
                            to = %company.company_id,
                            "category moved to another company"
                        );
                    }
                    existing.reassign(&category_rules.category_name, &company.company_id);
                    stats.categories_updated += 1;
                    existing
                }
                None => {
                    stats.categories_created += 1;
                    Category::new(
                        &category_rules.category_id,
                        &category_rules.category_name,
                        &company.company_id,
                    )
                }
            };
            store.upsert_category(&category)?;

            stats.keywords_removed += store.delete_keywords_by_category(&category.category_id)?;
            for keyword in &category_rules.keywords {
                store.insert_keyword(&Keyword::new(keyword, &category.category_id))?;
                tracing::debug!(category_id = %category.category_id, keyword = %keyword, "keyword inserted");
                stats.keywords_inserted += 1;
            }

            tracing::info!(
                company_id = %company.company_id,
                category_id = %category.category_id,
                keywords = category_rules.keywords.len(),
                "category upserted"
            );
        }
    }

    Ok(stats)
}
