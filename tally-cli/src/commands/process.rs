//! Process command - ingest a rules document and a transaction export

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use tally_core::LoggingService;

use super::{emit_json, get_context};
use crate::output;

pub fn run(
    tally_dir: &Path,
    logger: Option<Arc<LoggingService>>,
    rules: &Path,
    transactions: &Path,
    json: bool,
) -> Result<()> {
    let ctx = get_context(tally_dir, logger)?;
    let result = ctx.ingest_service.process_files(rules, transactions);

    if json {
        return emit_json(result);
    }

    let report = result?;
    let summary = &report.summary;
    output::success(&summary.message);
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["", "Count"]);
    table.add_row(vec![
        "Transactions".to_string(),
        summary.total_transactions.to_string(),
    ]);
    table.add_row(vec![
        "Classified".to_string(),
        summary.classified_transactions.to_string(),
    ]);
    table.add_row(vec![
        "Unclassified".to_string(),
        summary.unclassified_transactions.to_string(),
    ]);
    table.add_row(vec![
        "Duplicates skipped".to_string(),
        summary.duplicates_skipped.to_string(),
    ]);
    println!("{}", table);

    let rules = &report.rules;
    println!();
    println!("{}", "Rules".bold());
    println!(
        "  Companies: {} created, {} updated",
        rules.companies_created, rules.companies_updated
    );
    println!(
        "  Categories: {} created, {} updated",
        rules.categories_created, rules.categories_updated
    );
    println!(
        "  Keywords: {} inserted, {} replaced ({} distinct in index)",
        rules.keywords_inserted, rules.keywords_removed, report.indexed_keywords
    );
    if rules.categories_skipped > 0 {
        output::warning(&skipped_message(rules.categories_skipped));
    }

    println!();
    println!("Batch: {}", summary.batch_id.to_string().dimmed());

    Ok(())
}

fn skipped_message(skipped: usize) -> String {
    format!(
        "  {} categor{} skipped (blank id or name); see the warnings on stderr",
        skipped,
        if skipped == 1 { "y" } else { "ies" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_message() {
        assert_eq!(
            skipped_message(1),
            "  1 category skipped (blank id or name); see the warnings on stderr"
        );
        let many = skipped_message(3);
        assert!(many.starts_with("  3 categories skipped"));
        assert!(!many.contains("TALLY_LOG"));
    }
}
