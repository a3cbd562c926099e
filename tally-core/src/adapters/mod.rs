//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the LedgerStore port (auto-commit repository and unit of work)
//! - An in-memory store backing the service unit tests

pub mod duckdb;

#[cfg(test)]
pub mod memory;
