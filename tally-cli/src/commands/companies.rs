//! Companies command - the stored company / category / keyword catalogue

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use tally_core::LoggingService;

use super::{emit_json, get_context};
use crate::output;

pub fn run(tally_dir: &Path, logger: Option<Arc<LoggingService>>, json: bool) -> Result<()> {
    let ctx = get_context(tally_dir, logger)?;
    let result = ctx.record_service.companies();

    if json {
        return emit_json(result);
    }

    let companies = result?;
    if companies.is_empty() {
        println!("No companies yet. Run `tally process` with a rules document first.");
        return Ok(());
    }

    for company in &companies {
        println!(
            "{} {}",
            company.company_name.bold(),
            format!("({})", company.company_id).dimmed()
        );

        if company.categories.is_empty() {
            println!("  {}", "no categories".dimmed());
            println!();
            continue;
        }

        let mut table = output::create_table();
        table.set_header(vec!["Category", "Name", "Keywords"]);
        for category in &company.categories {
            table.add_row(vec![
                category.category_id.clone(),
                category.category_name.clone(),
                category.keywords.join(", "),
            ]);
        }
        println!("{}", table);
        println!();
    }

    Ok(())
}
