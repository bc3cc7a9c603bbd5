//! Stock trade data model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_journal_core::{Fill, Side};

use super::{require_non_empty, require_non_negative, require_positive, DateRange, ValidationError};

/// Buy or sell. Also the opening side of an option trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Side>().ok().map(Self::from)
    }
}

impl From<Side> for TradeSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Self::Buy,
            Side::Sell => Self::Sell,
        }
    }
}

impl From<TradeSide> for Side {
    fn from(side: TradeSide) -> Self {
        match side {
            TradeSide::Buy => Self::Buy,
            TradeSide::Sell => Self::Sell,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockTradeRecord {
    pub id: i64,
    pub owner_id: i64,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub fees: f64,
    pub trade_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl StockTradeRecord {
    /// Cash impact of the trade: negative for buys, positive for sells, net of fees.
    #[must_use]
    pub fn net_cash(&self) -> f64 {
        let gross = self.quantity * self.price;
        match self.side {
            TradeSide::Buy => -(gross + self.fees),
            TradeSide::Sell => gross - self.fees,
        }
    }

    #[must_use]
    pub fn to_fill(&self) -> Fill {
        Fill {
            symbol: self.symbol.clone(),
            side: self.side.into(),
            quantity: self.quantity,
            price: self.price,
            fees: self.fees,
        }
    }
}

/// Create / replace payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockTrade {
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub fees: f64,
    pub trade_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewStockTrade {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.symbol = self.symbol.trim().to_uppercase();
        self.notes = self.notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// # Errors
    /// Returns an error for an empty symbol, non-positive quantity, or negative price/fees.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("symbol", &self.symbol)?;
        require_positive("quantity", self.quantity)?;
        require_non_negative("price", self.price)?;
        require_non_negative("fees", self.fees)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockTradeFilter {
    pub symbol: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl StockTradeFilter {
    #[must_use]
    pub fn range(&self) -> DateRange {
        DateRange::new(self.from, self.to)
    }

    #[must_use]
    pub fn normalized_symbol(&self) -> Option<String> {
        self.symbol
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(side: TradeSide) -> StockTradeRecord {
        StockTradeRecord {
            id: 1,
            owner_id: 1,
            symbol: "SPY".to_string(),
            side,
            quantity: 10.0,
            price: 500.0,
            fees: 1.0,
            trade_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            notes: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_net_cash() {
        assert!((trade(TradeSide::Buy).net_cash() + 5001.0).abs() < 1e-9);
        assert!((trade(TradeSide::Sell).net_cash() - 4999.0).abs() < 1e-9);
    }

    #[test]
    fn test_side_parse_accepts_broker_codes() {
        assert_eq!(TradeSide::parse("BOT"), Some(TradeSide::Buy));
        assert_eq!(TradeSide::parse("sell"), Some(TradeSide::Sell));
        assert_eq!(TradeSide::parse("short"), None);
    }

    #[test]
    fn test_normalize_and_validate() {
        let trade = NewStockTrade {
            symbol: " aapl ".to_string(),
            side: TradeSide::Buy,
            quantity: 1.0,
            price: 10.0,
            fees: 0.0,
            trade_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            notes: Some("   ".to_string()),
        }
        .normalized();
        assert_eq!(trade.symbol, "AAPL");
        assert!(trade.notes.is_none());
        assert!(trade.validate().is_ok());

        let bad = NewStockTrade {
            quantity: 0.0,
            ..trade
        };
        assert_eq!(bad.validate().unwrap_err().field, "quantity");
    }

    #[test]
    fn test_deserialize_defaults() {
        let trade: NewStockTrade = serde_json::from_str(
            r#"{"symbol":"MSFT","side":"sell","quantity":2,"price":400.5,"trade_date":"2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(trade.side, TradeSide::Sell);
        assert!(trade.fees.abs() < f64::EPSILON);
        assert!(trade.notes.is_none());
    }
}
