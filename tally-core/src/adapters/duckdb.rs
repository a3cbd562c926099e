//! DuckDB repository implementation
//!
//! `DuckDbRepository` auto-commits every call. `DuckDbUnitOfWork` holds the
//! connection lock for its whole lifetime and wraps every call in one
//! database transaction; dropping it without `commit` rolls back.
//! Both expose the same `LedgerStore` surface through the query functions
//! at the bottom of this file.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::types::Type;
use duckdb::{params, Connection};

use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountingRecord, BankTransaction, Category, Company, DedupKey, Keyword, Page, PageRequest,
};
use crate::ports::LedgerStore;
use crate::services::{MigrationResult, MigrationService};

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) the ledger database file
    pub fn new(db_path: &Path) -> Result<Self> {
        // Extension autoloading stays off; JSON is statically linked via the "json" feature
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        tracing::debug!(path = %db_path.display(), "opened ledger database");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        })
    }

    /// Volatile database, gone when the repository is dropped
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let result = self.run_migrations()?;
        if !result.applied.is_empty() {
            tracing::info!(applied = ?result.applied, "ledger schema migrated");
        }
        Ok(())
    }

    /// Start a unit of work. Other callers block until it commits or drops.
    pub fn begin(&self) -> Result<DuckDbUnitOfWork<'_>> {
        let conn = self.conn()?;
        conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(DuckDbUnitOfWork {
            conn,
            finished: false,
        })
    }

    /// Path of the backing file; `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Number of stored transactions across all companies
    pub fn transaction_count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM bank_transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl LedgerStore for DuckDbRepository {
    fn find_company(&self, company_id: &str) -> Result<Option<Company>> {
        find_company(&*self.conn()?, company_id)
    }

    fn upsert_company(&self, company: &Company) -> Result<()> {
        upsert_company(&*self.conn()?, company)
    }

    fn list_companies(&self) -> Result<Vec<Company>> {
        list_companies(&*self.conn()?)
    }

    fn find_category(&self, category_id: &str) -> Result<Option<Category>> {
        find_category(&*self.conn()?, category_id)
    }

    fn upsert_category(&self, category: &Category) -> Result<()> {
        upsert_category(&*self.conn()?, category)
    }

    fn list_categories_by_company(&self, company_id: &str) -> Result<Vec<Category>> {
        list_categories_by_company(&*self.conn()?, company_id)
    }

    fn delete_keywords_by_category(&self, category_id: &str) -> Result<usize> {
        delete_keywords_by_category(&*self.conn()?, category_id)
    }

    fn insert_keyword(&self, keyword: &Keyword) -> Result<()> {
        insert_keyword(&*self.conn()?, keyword)
    }

    fn list_keywords_by_category(&self, category_id: &str) -> Result<Vec<Keyword>> {
        list_keywords_by_category(&*self.conn()?, category_id)
    }

    fn transaction_exists(&self, key: &DedupKey<'_>) -> Result<bool> {
        transaction_exists(&*self.conn()?, key)
    }

    fn insert_transaction(&self, tx: &BankTransaction) -> Result<i64> {
        insert_transaction(&*self.conn()?, tx)
    }

    fn count_transactions_by_company(&self, company_id: &str) -> Result<i64> {
        count_transactions_by_company(&*self.conn()?, company_id, false)
    }

    fn count_classified_transactions_by_company(&self, company_id: &str) -> Result<i64> {
        count_transactions_by_company(&*self.conn()?, company_id, true)
    }

    fn find_records_by_company(
        &self,
        company_id: &str,
        request: &PageRequest,
    ) -> Result<Page<AccountingRecord>> {
        find_records(&*self.conn()?, Some(company_id), request)
    }

    fn find_unclassified_records(&self, request: &PageRequest) -> Result<Page<AccountingRecord>> {
        find_records(&*self.conn()?, None, request)
    }
}

/// One database transaction over the repository connection
pub struct DuckDbUnitOfWork<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl DuckDbUnitOfWork<'_> {
    pub fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for DuckDbUnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "rollback of abandoned unit of work failed");
            }
        }
    }
}

impl LedgerStore for DuckDbUnitOfWork<'_> {
    fn find_company(&self, company_id: &str) -> Result<Option<Company>> {
        find_company(&self.conn, company_id)
    }

    fn upsert_company(&self, company: &Company) -> Result<()> {
        upsert_company(&self.conn, company)
    }

    fn list_companies(&self) -> Result<Vec<Company>> {
        list_companies(&self.conn)
    }

    fn find_category(&self, category_id: &str) -> Result<Option<Category>> {
        find_category(&self.conn, category_id)
    }

    fn upsert_category(&self, category: &Category) -> Result<()> {
        upsert_category(&self.conn, category)
    }

    fn list_categories_by_company(&self, company_id: &str) -> Result<Vec<Category>> {
        list_categories_by_company(&self.conn, company_id)
    }

    fn delete_keywords_by_category(&self, category_id: &str) -> Result<usize> {
        delete_keywords_by_category(&self.conn, category_id)
    }

    fn insert_keyword(&self, keyword: &Keyword) -> Result<()> {
        insert_keyword(&self.conn, keyword)
    }

    fn list_keywords_by_category(&self, category_id: &str) -> Result<Vec<Keyword>> {
        list_keywords_by_category(&self.conn, category_id)
    }

    fn transaction_exists(&self, key: &DedupKey<'_>) -> Result<bool> {
        transaction_exists(&self.conn, key)
    }

    fn insert_transaction(&self, tx: &BankTransaction) -> Result<i64> {
        insert_transaction(&self.conn, tx)
    }

    fn count_transactions_by_company(&self, company_id: &str) -> Result<i64> {
        count_transactions_by_company(&self.conn, company_id, false)
    }

    fn count_classified_transactions_by_company(&self, company_id: &str) -> Result<i64> {
        count_transactions_by_company(&self.conn, company_id, true)
    }

    fn find_records_by_company(
        &self,
        company_id: &str,
        request: &PageRequest,
    ) -> Result<Page<AccountingRecord>> {
        find_records(&self.conn, Some(company_id), request)
    }

    fn find_unclassified_records(&self, request: &PageRequest) -> Result<Page<AccountingRecord>> {
        find_records(&self.conn, None, request)
    }
}

// === Companies ===

fn find_company(conn: &Connection, company_id: &str) -> Result<Option<Company>> {
    let mut stmt = conn.prepare(
        "SELECT company_id, company_name, created_at::VARCHAR, updated_at::VARCHAR
         FROM companies WHERE company_id = ?",
    )?;
    let mut rows = stmt.query_map([company_id], row_to_company)?;
    Ok(rows.next().transpose()?)
}

fn upsert_company(conn: &Connection, company: &Company) -> Result<()> {
    conn.execute(
        "INSERT INTO companies (company_id, company_name, created_at, updated_at)
         VALUES (?, ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))
         ON CONFLICT (company_id) DO UPDATE SET
            company_name = EXCLUDED.company_name,
            updated_at = EXCLUDED.updated_at",
        params![
            company.company_id,
            company.company_name,
            format_timestamp(&company.created_at),
            format_timestamp(&company.updated_at),
        ],
    )?;
    Ok(())
}

fn list_companies(conn: &Connection) -> Result<Vec<Company>> {
    let mut stmt = conn.prepare(
        "SELECT company_id, company_name, created_at::VARCHAR, updated_at::VARCHAR
         FROM companies ORDER BY company_id",
    )?;
    let companies = stmt
        .query_map([], row_to_company)?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(companies)
}

fn row_to_company(row: &duckdb::Row) -> duckdb::Result<Company> {
    Ok(Company {
        company_id: row.get(0)?,
        company_name: row.get(1)?,
        created_at: timestamp_column(row, 2)?,
        updated_at: timestamp_column(row, 3)?,
    })
}

// === Categories ===

fn find_category(conn: &Connection, category_id: &str) -> Result<Option<Category>> {
    let mut stmt = conn.prepare(
        "SELECT category_id, category_name, company_id, created_at::VARCHAR, updated_at::VARCHAR
         FROM categories WHERE category_id = ?",
    )?;
    let mut rows = stmt.query_map([category_id], row_to_category)?;
    Ok(rows.next().transpose()?)
}

fn upsert_category(conn: &Connection, category: &Category) -> Result<()> {
    conn.execute(
        "INSERT INTO categories (category_id, category_name, company_id, created_at, updated_at)
         VALUES (?, ?, ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))
         ON CONFLICT (category_id) DO UPDATE SET
            category_name = EXCLUDED.category_name,
            company_id = EXCLUDED.company_id,
            updated_at = EXCLUDED.updated_at",
        params![
            category.category_id,
            category.category_name,
            category.company_id,
            format_timestamp(&category.created_at),
            format_timestamp(&category.updated_at),
        ],
    )?;
    Ok(())
}

fn list_categories_by_company(conn: &Connection, company_id: &str) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT category_id, category_name, company_id, created_at::VARCHAR, updated_at::VARCHAR
         FROM categories WHERE company_id = ? ORDER BY category_id",
    )?;
    let categories = stmt
        .query_map([company_id], row_to_category)?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(categories)
}

fn row_to_category(row: &duckdb::Row) -> duckdb::Result<Category> {
    Ok(Category {
        category_id: row.get(0)?,
        category_name: row.get(1)?,
        company_id: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
        updated_at: timestamp_column(row, 4)?,
    })
}

// === Keywords ===

fn delete_keywords_by_category(conn: &Connection, category_id: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM keywords WHERE category_id = ?", [category_id])?;
    Ok(removed)
}

fn insert_keyword(conn: &Connection, keyword: &Keyword) -> Result<()> {
    conn.execute(
        "INSERT INTO keywords (keyword, category_id) VALUES (?, ?)",
        params![keyword.keyword, keyword.category_id],
    )?;
    Ok(())
}

fn list_keywords_by_category(conn: &Connection, category_id: &str) -> Result<Vec<Keyword>> {
    let mut stmt =
        conn.prepare("SELECT keyword, category_id FROM keywords WHERE category_id = ? ORDER BY id")?;
    let keywords = stmt
        .query_map([category_id], |row| {
            Ok(Keyword {
                keyword: row.get(0)?,
                category_id: row.get(1)?,
            })
        })?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(keywords)
}

// === Transactions ===

fn transaction_exists(conn: &Connection, key: &DedupKey<'_>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bank_transactions
         WHERE description = ?
           AND transaction_date = CAST(? AS TIMESTAMP)
           AND balance_after = ?",
        params![
            key.description,
            format_naive(&key.transaction_date),
            key.balance_after
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn insert_transaction(conn: &Connection, tx: &BankTransaction) -> Result<i64> {
    let id: i64 = conn.query_row(
        "INSERT INTO bank_transactions (
            transaction_date, description, deposit_amount, withdrawal_amount,
            balance_after, branch, company_id, category_id, is_classified,
            batch_id, created_at
         ) VALUES (CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))
         RETURNING id",
        params![
            format_naive(&tx.transaction_date),
            tx.description,
            tx.deposit_amount,
            tx.withdrawal_amount,
            tx.balance_after,
            tx.branch,
            tx.company_id(),
            tx.category_id(),
            tx.is_classified(),
            tx.batch_id.to_string(),
            format_timestamp(&tx.created_at),
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn count_transactions_by_company(
    conn: &Connection,
    company_id: &str,
    classified_only: bool,
) -> Result<i64> {
    let sql = if classified_only {
        "SELECT COUNT(*) FROM bank_transactions WHERE company_id = ? AND is_classified"
    } else {
        "SELECT COUNT(*) FROM bank_transactions WHERE company_id = ?"
    };
    let count: i64 = conn.query_row(sql, [company_id], |row| row.get(0))?;
    Ok(count)
}

/// Paged listing. `Some(company)` lists that company's transactions,
/// `None` lists the unclassified ones.
fn find_records(
    conn: &Connection,
    company_id: Option<&str>,
    request: &PageRequest,
) -> Result<Page<AccountingRecord>> {
    let filter = if company_id.is_some() {
        "t.company_id = ?"
    } else {
        "NOT t.is_classified"
    };

    let count_sql = format!("SELECT COUNT(*) FROM bank_transactions t WHERE {}", filter);
    let total: i64 = match company_id {
        Some(id) => conn.query_row(&count_sql, [id], |row| row.get(0))?,
        None => conn.query_row(&count_sql, [], |row| row.get(0))?,
    };

    // Sort column and direction come from closed enums, never from user text
    let select_sql = format!(
        "SELECT t.id, t.transaction_date::VARCHAR, t.description, t.deposit_amount,
                t.withdrawal_amount, t.balance_after, t.branch,
                t.company_id, co.company_name, t.category_id, ca.category_name,
                t.is_classified
         FROM bank_transactions t
         LEFT JOIN companies co ON co.company_id = t.company_id
         LEFT JOIN categories ca ON ca.category_id = t.category_id
         WHERE {filter}
         ORDER BY t.{column} {dir}, t.id {dir}
         LIMIT ? OFFSET ?",
        filter = filter,
        column = request.sort_by.column(),
        dir = request.direction.sql(),
    );

    let mut stmt = conn.prepare(&select_sql)?;
    let content = match company_id {
        Some(id) => stmt
            .query_map(params![id, request.limit(), request.offset()], row_to_record)?
            .collect::<duckdb::Result<Vec<_>>>()?,
        None => stmt
            .query_map(params![request.limit(), request.offset()], row_to_record)?
            .collect::<duckdb::Result<Vec<_>>>()?,
    };

    Ok(Page::new(content, request, total))
}

fn row_to_record(row: &duckdb::Row) -> duckdb::Result<AccountingRecord> {
    Ok(AccountingRecord {
        id: row.get(0)?,
        transaction_date: naive_column(row, 1)?,
        description: row.get(2)?,
        deposit_amount: row.get(3)?,
        withdrawal_amount: row.get(4)?,
        balance_after: row.get(5)?,
        branch: row.get(6)?,
        company_id: row.get(7)?,
        company_name: row.get(8)?,
        category_id: row.get(9)?,
        category_name: row.get(10)?,
        is_classified: row.get(11)?,
    })
}

// Helper functions

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn format_naive(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    format_naive(&value.naive_utc())
}

fn naive_column(row: &duckdb::Row, idx: usize) -> duckdb::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &duckdb::Row, idx: usize) -> duckdb::Result<DateTime<Utc>> {
    naive_column(row, idx).map(|naive| naive.and_utc())
}
