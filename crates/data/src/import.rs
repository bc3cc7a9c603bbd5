//! CSV import of option trades.
//!
//! Expected header:
//! `underlying,option_type,side,strike,expiration,quantity,premium,fees,open_date,status,close_date,close_price,notes`
//!
//! `fees`, `status`, `close_date`, `close_price` and `notes` may be blank.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{NewOptionTrade, OptionStatus, OptionType, TradeSide};

/// Rows parsed from a CSV file plus a message per row that could not be parsed.
#[derive(Debug, Default)]
pub struct ParsedOptions {
    /// Parsed trades with their one-based data row number in the file.
    pub rows: Vec<(usize, NewOptionTrade)>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OptionCsvRow {
    underlying: String,
    option_type: String,
    side: String,
    strike: f64,
    expiration: String,
    quantity: i64,
    premium: f64,
    fees: Option<f64>,
    open_date: String,
    status: Option<String>,
    close_date: Option<String>,
    close_price: Option<f64>,
    notes: Option<String>,
}

impl OptionCsvRow {
    fn into_trade(self) -> Result<NewOptionTrade, String> {
        let option_type = OptionType::parse(&self.option_type)
            .ok_or_else(|| format!("unknown option_type '{}'", self.option_type))?;
        let side = TradeSide::parse(&self.side).ok_or_else(|| format!("unknown side '{}'", self.side))?;
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => OptionStatus::Open,
            Some(s) => OptionStatus::parse(s).ok_or_else(|| format!("unknown status '{s}'"))?,
        };
        let close_date = match self.close_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(parse_date("close_date", s)?),
        };

        Ok(NewOptionTrade {
            underlying: self.underlying,
            option_type,
            side,
            strike: self.strike,
            expiration: parse_date("expiration", &self.expiration)?,
            quantity: self.quantity,
            premium: self.premium,
            fees: self.fees.unwrap_or(0.0),
            open_date: parse_date("open_date", &self.open_date)?,
            status,
            close_date,
            close_price: self.close_price,
            notes: self.notes,
        })
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{field}: expected YYYY-MM-DD, got '{value}'"))
}

pub struct OptionCsvImporter;

impl OptionCsvImporter {
    /// Parses every record; a malformed record is reported in `rejected`
    /// with its line number and does not stop the remaining rows.
    ///
    /// # Errors
    /// Returns error if the header cannot be read.
    pub fn parse<R: Read>(reader: R) -> Result<ParsedOptions> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        csv_reader.headers().context("Failed to read CSV header")?;

        let mut parsed = ParsedOptions::default();
        for result in csv_reader.deserialize::<OptionCsvRow>() {
            let line = parsed.line();
            match result {
                Ok(raw) => match raw.into_trade() {
                    Ok(trade) => parsed.rows.push((line, trade)),
                    Err(e) => parsed.rejected.push(format!("row {line}: {e}")),
                },
                Err(e) => parsed.rejected.push(format!("row {line}: {e}")),
            }
        }

        tracing::debug!(
            rows = parsed.rows.len(),
            rejected = parsed.rejected.len(),
            "Parsed option CSV"
        );
        Ok(parsed)
    }

    /// # Errors
    /// Returns error if the file cannot be opened or its header cannot be read.
    pub fn parse_file(path: &Path) -> Result<ParsedOptions> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        Self::parse(file)
    }
}

impl ParsedOptions {
    /// One-based data row number of the record currently being processed.
    fn line(&self) -> usize {
        self.rows.len() + self.rejected.len() + 1
    }
}
