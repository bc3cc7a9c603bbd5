//! Data models for the trade journal.
//!
//! Models derive `sqlx::FromRow` for database compatibility. Amounts are
//! stored as `REAL` and surfaced as `f64`; calendar dates are `NaiveDate`
//! (`YYYY-MM-DD` text) and audit columns are unix seconds.

pub mod deposit;
pub mod market_price;
pub mod net_equity;
pub mod option_trade;
pub mod project;
pub mod stock_trade;
pub mod user;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

pub use deposit::{DepositKind, DepositRecord, NewDeposit};
pub use market_price::{FedFundsRate, MarketPriceRecord, NewMarketPrice};
pub use net_equity::{NetEquityRecord, NewNetEquity};
pub use option_trade::{
    ImportSummary, NewOptionTrade, OptionFilter, OptionStatus, OptionSummary, OptionTradeRecord,
    OptionType,
};
pub use project::{
    CommentRecord, ItemPriority, ItemRecord, ItemStatus, ItemUpdate, NewComment, NewItem,
    NewProject, ProjectRecord, ProjectStatus, ProjectUpdate,
};
pub use stock_trade::{NewStockTrade, StockTradeFilter, StockTradeRecord, TradeSide};
pub use user::{NewUser, Role, UserRecord, UserUpdate};

/// Input rejected before it reaches the database.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Ensures a value is finite and strictly positive.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be greater than zero"))
    }
}

/// Ensures a value is finite and not negative.
pub(crate) fn require_non_negative(
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must not be negative"))
    }
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Inclusive date window used by list queries. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub const fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// # Errors
    /// Returns an error if `to` is before `from`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if to < from => {
                Err(ValidationError::new("to", "must not be before 'from'"))
            }
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}
