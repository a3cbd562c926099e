//! Records command - paged listing of stored transactions

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tally_core::{AccountingRecord, LoggingService, Page, SortDirection, SortField};

use super::{emit_json, get_context};
use crate::output;

#[derive(Args, Debug)]
pub struct PagingArgs {
    /// Zero-based page index
    #[arg(long, default_value = "0")]
    pub page: u32,
    /// Page size (defaults to records.defaultPageSize)
    #[arg(long)]
    pub size: Option<u32>,
    /// Sort key: transactionDate, description, depositAmount, withdrawalAmount, balanceAfter, id
    #[arg(long, default_value = "transactionDate")]
    pub sort: String,
    /// Sort direction: asc or desc
    #[arg(long, default_value = "desc")]
    pub direction: String,
}

pub fn run(
    tally_dir: &Path,
    logger: Option<Arc<LoggingService>>,
    company_id: Option<&str>,
    paging: &PagingArgs,
    json: bool,
) -> Result<()> {
    let ctx = get_context(tally_dir, logger)?;
    let service = &ctx.record_service;

    let result = paging
        .sort
        .parse::<SortField>()
        .and_then(|sort_by| {
            service.page_request(
                paging.page,
                paging.size,
                sort_by,
                SortDirection::parse(&paging.direction),
            )
        })
        .and_then(|request| service.records(company_id, &request));

    if json {
        return emit_json(result);
    }

    let page = result?;
    print_page(&page, company_id);
    Ok(())
}

fn print_page(page: &Page<AccountingRecord>, company_id: Option<&str>) {
    let heading = match company_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("Transactions of {}", id),
        None => "Unclassified transactions".to_string(),
    };
    println!("{}", heading.bold());

    if page.content.is_empty() {
        println!("No transactions found.");
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec![
        "ID",
        "Date",
        "Description",
        "Deposit",
        "Withdrawal",
        "Balance",
        "Branch",
        "Category",
    ]);
    for record in &page.content {
        let category = match (&record.category_name, &record.category_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.clone(),
            (None, None) => "-".dimmed().to_string(),
        };
        table.add_row(vec![
            record.id.to_string(),
            record.transaction_date.format("%Y-%m-%d %H:%M").to_string(),
            record.description.clone(),
            output::format_amount(record.deposit_amount),
            output::format_amount(record.withdrawal_amount),
            output::format_amount(record.balance_after),
            record.branch.clone().unwrap_or_default(),
            category,
        ]);
    }
    println!("{}", table);

    output::info(&format!(
        "Page {} of {} ({} transactions)",
        page.page + 1,
        page.total_pages.max(1),
        page.total_elements
    ));
}
