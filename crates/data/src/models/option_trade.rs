//! Option trade data model.
//!
//! One row per opened option position. Premiums and close prices are per
//! share; a contract covers [`CONTRACT_MULTIPLIER`] shares.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    require_non_empty, require_non_negative, require_positive, TradeSide, ValidationError,
};

pub const CONTRACT_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Some(Self::Call),
            "put" | "p" => Some(Self::Put),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OptionStatus {
    Open,
    Closed,
    Expired,
    Assigned,
    Exercised,
}

impl OptionStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Expired => "expired",
            Self::Assigned => "assigned",
            Self::Exercised => "exercised",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "expired" => Some(Self::Expired),
            "assigned" => Some(Self::Assigned),
            "exercised" => Some(Self::Exercised),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl Default for OptionStatus {
    fn default() -> Self {
        Self::Open
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OptionTradeRecord {
    pub id: i64,
    pub owner_id: i64,
    pub underlying: String,
    pub option_type: OptionType,
    /// Opening side: `sell` for written options, `buy` for long options.
    pub side: TradeSide,
    pub strike: f64,
    pub expiration: NaiveDate,
    pub quantity: i64,
    pub premium: f64,
    pub fees: f64,
    pub open_date: NaiveDate,
    pub status: OptionStatus,
    pub close_date: Option<NaiveDate>,
    pub close_price: Option<f64>,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl OptionTradeRecord {
    #[allow(clippy::cast_precision_loss)]
    fn shares(&self) -> f64 {
        self.quantity as f64 * CONTRACT_MULTIPLIER
    }

    /// Premium received (positive) or paid (negative) when the position was opened.
    #[must_use]
    pub fn opening_cash(&self) -> f64 {
        let gross = self.premium * self.shares();
        match self.side {
            TradeSide::Sell => gross,
            TradeSide::Buy => -gross,
        }
    }

    /// Realized P&L once the position is no longer open.
    ///
    /// Expired options settle at zero; assigned or exercised ones use the
    /// recorded close price when present.
    #[must_use]
    pub fn realized_pnl(&self) -> Option<f64> {
        if self.status.is_open() {
            return None;
        }
        let exit = match self.status {
            OptionStatus::Expired => 0.0,
            _ => self.close_price.unwrap_or(0.0),
        };
        let per_share = match self.side {
            TradeSide::Sell => self.premium - exit,
            TradeSide::Buy => exit - self.premium,
        };
        Some(per_share * self.shares() - self.fees)
    }

    #[must_use]
    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiration - today).num_days()
    }
}

/// Create / replace / import payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOptionTrade {
    pub underlying: String,
    pub option_type: OptionType,
    pub side: TradeSide,
    pub strike: f64,
    pub expiration: NaiveDate,
    pub quantity: i64,
    pub premium: f64,
    #[serde(default)]
    pub fees: f64,
    pub open_date: NaiveDate,
    #[serde(default)]
    pub status: OptionStatus,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub close_price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewOptionTrade {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.underlying = self.underlying.trim().to_uppercase();
        self.notes = self.notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// # Errors
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("underlying", &self.underlying)?;
        require_positive("strike", self.strike)?;
        if self.quantity <= 0 {
            return Err(ValidationError::new("quantity", "must be greater than zero"));
        }
        require_non_negative("premium", self.premium)?;
        require_non_negative("fees", self.fees)?;
        if self.expiration < self.open_date {
            return Err(ValidationError::new(
                "expiration",
                "must not be before open_date",
            ));
        }
        if let Some(close_price) = self.close_price {
            require_non_negative("close_price", close_price)?;
        }
        if let Some(close_date) = self.close_date {
            if close_date < self.open_date {
                return Err(ValidationError::new(
                    "close_date",
                    "must not be before open_date",
                ));
            }
        }
        if self.status == OptionStatus::Closed && self.close_price.is_none() {
            return Err(ValidationError::new(
                "close_price",
                "is required for closed positions",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionFilter {
    pub status: Option<OptionStatus>,
    pub underlying: Option<String>,
}

/// Aggregates over a set of option trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionSummary {
    pub open_positions: usize,
    pub closed_positions: usize,
    pub open_contracts: i64,
    pub premium_collected: f64,
    pub premium_paid: f64,
    pub total_fees: f64,
    pub realized_pnl: f64,
}

impl OptionSummary {
    #[must_use]
    pub fn from_trades(trades: &[OptionTradeRecord]) -> Self {
        let mut summary = Self::default();
        for trade in trades {
            let cash = trade.opening_cash();
            if cash >= 0.0 {
                summary.premium_collected += cash;
            } else {
                summary.premium_paid += -cash;
            }
            summary.total_fees += trade.fees;

            match trade.realized_pnl() {
                Some(pnl) => {
                    summary.closed_positions += 1;
                    summary.realized_pnl += pnl;
                }
                None => {
                    summary.open_positions += 1;
                    summary.open_contracts += trade.quantity;
                }
            }
        }
        summary
    }
}

/// Outcome of a bulk option import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    /// Folds rows rejected before reaching the database into the failure count.
    pub fn record_rejected(&mut self, rejected: Vec<String>) {
        self.failed += rejected.len();
        self.errors.extend(rejected);
    }
}
