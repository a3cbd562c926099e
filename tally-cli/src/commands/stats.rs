//! Stats command - per-company classification statistics

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
    company_id: &str,
    json: bool,
) -> Result<()> {
    let ctx = get_context(tally_dir, logger)?;
    let result = ctx.statistics_service.company_statistics(company_id);

    if json {
        return emit_json(result);
    }

    let stats = result?;
    println!("{}", format!("Statistics for {}", stats.company_id).bold());

    let mut table = output::create_table();
    table.add_row(vec!["Transactions", &stats.total_transactions.to_string()]);
    table.add_row(vec!["Classified", &stats.classified_transactions.to_string()]);
    table.add_row(vec!["Unclassified", &stats.unclassified_transactions.to_string()]);
    table.add_row(vec![
        "Classification rate",
        &format!("{:.1}%", stats.classification_rate),
    ]);
    println!("{}", table);

    Ok(())
}
