//! Deposits and withdrawals (external cash flows).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_journal_core::CashFlow;

use super::{require_positive, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DepositKind {
    Deposit,
    Withdrawal,
}

impl DepositKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Some(Self::Deposit),
            "withdrawal" | "withdraw" => Some(Self::Withdrawal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepositRecord {
    pub id: i64,
    pub owner_id: i64,
    pub deposit_date: NaiveDate,
    /// Always positive; `kind` carries the direction.
    pub amount: f64,
    pub kind: DepositKind,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl DepositRecord {
    #[must_use]
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            DepositKind::Deposit => self.amount,
            DepositKind::Withdrawal => -self.amount,
        }
    }

    #[must_use]
    pub fn to_cash_flow(&self) -> CashFlow {
        CashFlow {
            date: self.deposit_date,
            amount: self.signed_amount(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeposit {
    pub deposit_date: NaiveDate,
    pub amount: f64,
    pub kind: DepositKind,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewDeposit {
    /// # Errors
    /// Returns an error for a non-positive amount.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("amount", self.amount)
    }
}
