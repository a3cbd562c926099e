//! Keyword index - case-folded keyword lookup rebuilt on every ingestion

use std::collections::BTreeMap;

use crate::domain::RuleSet;

/// Where a keyword sends a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTarget {
    pub company_id: String,
    pub category_id: String,
}

/// Immutable lowercased-keyword → (company, category) table
#[derive(Debug, Default)]
pub struct KeywordIndex {
    entries: BTreeMap<String, KeywordTarget>,
}

impl KeywordIndex {
    /// Flatten the rule tree in document order. A keyword declared twice
    /// keeps its last declaration.
    pub fn build(rules: &RuleSet) -> Self {
        let mut entries = BTreeMap::new();

        for (company, category) in rules.categories() {
            for keyword in &category.keywords {
                let target = KeywordTarget {
                    company_id: company.company_id.clone(),
                    category_id: category.category_id.clone(),
                };
                if let Some(previous) = entries.insert(keyword.to_lowercase(), target) {
                    if previous.category_id != category.category_id {
                        tracing::warn!(
                            keyword = %keyword.to_lowercase(),
                            replaced_company = %previous.company_id,
                            replaced_category = %previous.category_id,
                            company_id = %company.company_id,
                            category_id = %category.category_id,
                            "duplicate keyword; later declaration wins"
                        );
                    }
                }
            }
        }

        Self { entries }
    }

    /// Longest keyword contained in `description`, case-insensitively.
    ///
    /// Length is counted in characters. Among equally long matches the
    /// lexicographically smallest keyword wins.
    pub fn find_best_match(&self, description: &str) -> Option<(&str, &KeywordTarget)> {
        if description.trim().is_empty() {
            return None;
        }
        let haystack = description.to_lowercase();

        let mut best: Option<(&str, &KeywordTarget, usize)> = None;
        // BTreeMap iterates in key order, so a strict `>` keeps the smallest key on ties
        for (keyword, target) in &self.entries {
            if !haystack.contains(keyword.as_str()) {
                continue;
            }
            let len = keyword.chars().count();
            if best.map_or(true, |(_, _, best_len)| len > best_len) {
                best = Some((keyword.as_str(), target, len));
            }
        }

        best.map(|(keyword, target, _)| (keyword, target))
    }

    pub fn get(&self, keyword: &str) -> Option<&KeywordTarget> {
        self.entries.get(&keyword.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
