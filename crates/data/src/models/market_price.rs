//! Market closes and monthly federal funds rates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_journal_core::{margin::parse_month, EquityPoint};

use super::{require_non_empty, require_positive, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketPriceRecord {
    pub id: i64,
    pub symbol: String,
    pub price_date: NaiveDate,
    pub close: f64,
}

impl MarketPriceRecord {
    #[must_use]
    pub fn to_point(&self) -> EquityPoint {
        EquityPoint {
            date: self.price_date,
            equity: self.close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMarketPrice {
    pub symbol: String,
    pub price_date: NaiveDate,
    pub close: f64,
}

impl NewMarketPrice {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.symbol = self.symbol.trim().to_uppercase();
        self
    }

    /// # Errors
    /// Returns an error for an empty symbol or non-positive close.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("symbol", &self.symbol)?;
        require_positive("close", self.close)
    }
}

/// Monthly effective federal funds rate, annual percent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FedFundsRate {
    /// `YYYY-MM`
    pub month: String,
    pub rate: f64,
}

impl FedFundsRate {
    /// The month as zero-padded `YYYY-MM`, so `2024-5` and `2024-05` share a key.
    #[must_use]
    pub fn canonical_month(&self) -> Option<String> {
        parse_month(&self.month).map(|(year, month)| format!("{year:04}-{month:02}"))
    }

    /// # Errors
    /// Returns an error for a malformed month or a rate outside 0..=100.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if parse_month(&self.month).is_none() {
            return Err(ValidationError::new("month", "must be formatted YYYY-MM"));
        }
        if !(0.0..=100.0).contains(&self.rate) {
            return Err(ValidationError::new("rate", "must be a percent between 0 and 100"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fed_funds_validate() {
        let ok = FedFundsRate {
            month: "2024-05".to_string(),
            rate: 5.33,
        };
        assert!(ok.validate().is_ok());

        let bad_month = FedFundsRate {
            month: "2024/05".to_string(),
            rate: 5.33,
        };
        assert_eq!(bad_month.validate().unwrap_err().field, "month");

        let bad_rate = FedFundsRate {
            month: "2024-05".to_string(),
            rate: -1.0,
        };
        assert_eq!(bad_rate.validate().unwrap_err().field, "rate");
    }

    #[test]
    fn test_fed_funds_canonical_month() {
        let rate = |month: &str| FedFundsRate {
            month: month.to_string(),
            rate: 5.0,
        };
        assert_eq!(rate("2024-5").canonical_month().as_deref(), Some("2024-05"));
        assert_eq!(rate(" 2024-05").canonical_month(), None);
        assert_eq!(rate("2024-12").canonical_month().as_deref(), Some("2024-12"));
        assert_eq!(rate("2024-13").canonical_month(), None);
    }

    #[test]
    fn test_market_price_normalize() {
        let price = NewMarketPrice {
            symbol: " spy".to_string(),
            price_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close: 472.65,
        }
        .normalized();
        assert_eq!(price.symbol, "SPY");
        assert!(price.validate().is_ok());
    }
}
