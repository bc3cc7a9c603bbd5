//! Daily net-equity snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_journal_core::EquityPoint;

use super::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NetEquityRecord {
    pub id: i64,
    pub owner_id: i64,
    pub record_date: NaiveDate,
    pub net_equity: f64,
    pub created_at: i64,
}

impl NetEquityRecord {
    #[must_use]
    pub fn to_point(&self) -> EquityPoint {
        EquityPoint {
            date: self.record_date,
            equity: self.net_equity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNetEquity {
    pub record_date: NaiveDate,
    pub net_equity: f64,
}

impl NewNetEquity {
    /// Equity may be negative (a blown-up margin account), but must be a number.
    ///
    /// # Errors
    /// Returns an error for NaN or infinite values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.net_equity.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::new("net_equity", "must be a finite number"))
        }
    }
}
