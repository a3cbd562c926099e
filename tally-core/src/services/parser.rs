//! Transaction row decoding from bank exports (CSV or JSON)

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::config::{ColumnMappings, Config};
use crate::domain::result::{Error, Result};
use crate::domain::TransactionRow;

/// Input format of a transaction file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    Csv,
    Json,
}

impl RowFormat {
    /// Pick the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(RowFormat::Csv),
            "json" => Some(RowFormat::Json),
            _ => None,
        }
    }
}

/// Decodes bank export rows using configured header names
pub struct RowParser {
    columns: ColumnMappings,
    timestamp_format: String,
}

impl RowParser {
    pub fn new(columns: ColumnMappings, timestamp_format: impl Into<String>) -> Self {
        Self {
            columns,
            timestamp_format: timestamp_format.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.columns.clone(), config.timestamp_format.clone())
    }

    pub fn parse(&self, format: RowFormat, input: &[u8]) -> Result<Vec<TransactionRow>> {
        match format {
            RowFormat::Csv => self.parse_csv(input),
            RowFormat::Json => self.parse_json(input),
        }
    }

    /// CSV with a header row. Line numbers in errors count data rows from 1.
    pub fn parse_csv<R: Read>(&self, reader: R) -> Result<Vec<TransactionRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| Error::malformed_row(0, format!("unreadable header row: {}", e)))?
            .clone();
        let position = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            position(name)
                .ok_or_else(|| Error::malformed_row(0, format!("missing column '{}'", name)))
        };

        let date_idx = require(self.columns.transaction_date.as_str())?;
        let desc_idx = require(self.columns.description.as_str())?;
        let balance_idx = require(self.columns.balance.as_str())?;
        let deposit_idx = position(self.columns.deposit.as_str());
        let withdrawal_idx = position(self.columns.withdrawal.as_str());
        let branch_idx = position(self.columns.branch.as_str());

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let line = i + 1;
            let record = result.map_err(|e| Error::malformed_row(line, e.to_string()))?;
            if record.len() < headers.len() {
                return Err(Error::malformed_row(
                    line,
                    format!("row has {} fields, expected {}", record.len(), headers.len()),
                ));
            }
            let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

            rows.push(TransactionRow {
                transaction_date: self.parse_timestamp(field(Some(date_idx)), line)?,
                description: field(Some(desc_idx)).to_string(),
                deposit_amount: parse_amount(field(deposit_idx), line, "deposit")?,
                withdrawal_amount: parse_amount(field(withdrawal_idx), line, "withdrawal")?,
                balance_after: parse_amount(field(Some(balance_idx)), line, "balance")?,
                branch: non_blank(field(branch_idx)),
            });
        }

        tracing::debug!(rows = rows.len(), "decoded CSV transaction rows");
        Ok(rows)
    }

    /// JSON array of objects keyed by the bank headers or their snake_case
    /// English aliases. Strings and integers are both accepted for amounts.
    pub fn parse_json(&self, input: &[u8]) -> Result<Vec<TransactionRow>> {
        let value: Value = serde_json::from_slice(input)
            .map_err(|e| Error::malformed_row(0, format!("not valid JSON: {}", e)))?;
        let items = match value {
            Value::Array(items) => items,
            _ => return Err(Error::malformed_row(0, "expected a JSON array of rows")),
        };

        let mut rows = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let line = i + 1;
            let object = item
                .as_object()
                .ok_or_else(|| Error::malformed_row(line, "row is not an object"))?;

            let date = self.json_field(object, &self.columns.transaction_date, "transaction_date");
            let date = date.ok_or_else(|| Error::malformed_row(line, "missing transaction date"))?;
            let balance = self
                .json_field(object, &self.columns.balance, "balance_after")
                .ok_or_else(|| Error::malformed_row(line, "missing balance"))?;

            rows.push(TransactionRow {
                transaction_date: self.parse_timestamp(&json_text(date), line)?,
                description: self
                    .json_field(object, &self.columns.description, "description")
                    .map(json_text)
                    .unwrap_or_default(),
                deposit_amount: json_amount(
                    self.json_field(object, &self.columns.deposit, "deposit_amount"),
                    line,
                    "deposit",
                )?,
                withdrawal_amount: json_amount(
                    self.json_field(object, &self.columns.withdrawal, "withdrawal_amount"),
                    line,
                    "withdrawal",
                )?,
                balance_after: json_amount(Some(balance), line, "balance")?,
                branch: self
                    .json_field(object, &self.columns.branch, "branch")
                    .map(json_text)
                    .and_then(|b| non_blank(&b)),
            });
        }

        tracing::debug!(rows = rows.len(), "decoded JSON transaction rows");
        Ok(rows)
    }

    fn json_field<'v>(
        &self,
        object: &'v Map<String, Value>,
        header: &str,
        alias: &str,
    ) -> Option<&'v Value> {
        object
            .get(header)
            .or_else(|| object.get(alias))
            .filter(|v| !v.is_null())
    }

    /// Parse with the configured format; a date-only format yields midnight
    fn parse_timestamp(&self, raw: &str, line: usize) -> Result<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, &self.timestamp_format)
            .or_else(|_| {
                NaiveDate::parse_from_str(raw, &self.timestamp_format)
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
            })
            .map_err(|e| {
                Error::malformed_row(
                    line,
                    format!(
                        "timestamp '{}' does not match '{}': {}",
                        raw, self.timestamp_format, e
                    ),
                )
            })
    }
}

/// Whole-unit amount. Blank means 0; thousands separators are ignored.
pub fn parse_amount(raw: &str, line: usize, field: &str) -> Result<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0);
    }
    cleaned
        .parse::<i64>()
        .map_err(|_| Error::malformed_row(line, format!("{} amount '{}' is not a number", field, raw)))
}

fn json_amount(value: Option<&Value>, line: usize, field: &str) -> Result<i64> {
    match value {
        None => Ok(0),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            Error::malformed_row(line, format!("{} amount {} is not a whole number", field, n))
        }),
        Some(Value::String(s)) => parse_amount(s, line, field),
        Some(other) => Err(Error::malformed_row(
            line,
            format!("{} amount has unexpected type: {}", field, other),
        )),
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
