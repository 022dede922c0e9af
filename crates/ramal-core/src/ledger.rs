//! Transaction ledger parsing
//!
//! A ledger is a CSV file with at least `date`, `category` and `amount`
//! columns. Column order is free and extra columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A single ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
}

/// Positions of the required columns within a header row
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    category: usize,
    amount: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };

        Ok(Self {
            date: find("date")?,
            category: find("category")?,
            amount: find("amount")?,
        })
    }
}

/// Parse a ledger from any reader
///
/// Fails on the first row with an unparseable date or amount. Rows with an
/// empty category are skipped, since they cannot belong to any series.
pub fn parse_ledger<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 1;

        let date_str = record
            .get(columns.date)
            .ok_or_else(|| Error::Parse(format!("row {}: missing date", row)))?;
        let date = parse_date(date_str).map_err(|e| Error::Parse(format!("row {}: {}", row, e)))?;

        let amount_str = record
            .get(columns.amount)
            .ok_or_else(|| Error::Parse(format!("row {}: missing amount", row)))?;
        let amount =
            parse_amount(amount_str).map_err(|e| Error::Parse(format!("row {}: {}", row, e)))?;

        let category = record.get(columns.category).unwrap_or("").trim();
        if category.is_empty() {
            warn!(row, "Skipping ledger row without a category");
            continue;
        }

        transactions.push(Transaction {
            date,
            category: category.to_string(),
            amount,
        });
    }

    debug!("Parsed {} ledger transactions", transactions.len());
    Ok(transactions)
}

/// Parse a ledger from a file on disk
pub fn parse_ledger_file(path: &Path) -> Result<Vec<Transaction>> {
    let file = File::open(path)?;
    parse_ledger(file)
}

/// Parse a calendar date, truncating datetimes to their date
fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%Y/%m/%d", // 2024/01/15
        "%m/%d/%y", // 01/15/24
        "%m/%d/%Y", // 01/15/2024
        "%m-%d-%Y", // 01-15-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    let datetime_formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(format!("Unable to parse date: {:?}", s))
}

/// Parse a signed decimal amount
fn parse_amount(s: &str) -> std::result::Result<f64, String> {
    let trimmed = s.trim();

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Unable to parse amount: {:?}", s)),
    }
}
