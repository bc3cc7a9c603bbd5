use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" | "bot" => Ok(Self::Buy),
            "sell" | "s" | "sld" => Ok(Self::Sell),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

/// A single executed stock trade fed to the tracker.
#[derive(Debug, Clone)]
pub struct Fill {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub fees: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub symbol: String,
    /// Signed share count; negative is short.
    pub quantity: f64,
    /// Average cost per share, fees included.
    pub avg_cost: f64,
    pub realized_pnl: f64,
    pub trades: usize,
}

impl Position {
    fn new(symbol: String) -> Self {
        Self {
            symbol,
            quantity: 0.0,
            avg_cost: 0.0,
            realized_pnl: 0.0,
            trades: 0,
        }
    }

    #[must_use]
    pub fn cost_basis(&self) -> f64 {
        self.avg_cost * self.quantity.abs()
    }

    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.quantity.abs() < EPSILON
    }
}

/// Average-cost position tracker.
///
/// Symbols stay in the map once traded so fully closed positions still
/// report their realized P&L.
#[derive(Debug, Default)]
pub struct PositionTracker {
    positions: BTreeMap<String, Position>,
}

impl PositionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a fill and returns the P&L it realized, if it reduced a position.
    pub fn process_fill(&mut self, fill: &Fill) -> Option<f64> {
        let position = self
            .positions
            .entry(fill.symbol.clone())
            .or_insert_with(|| Position::new(fill.symbol.clone()));
        position.trades += 1;

        let signed_qty = match fill.side {
            Side::Buy => fill.quantity,
            Side::Sell => -fill.quantity,
        };

        let reducing = position.quantity * signed_qty < 0.0;
        if !reducing {
            // Opening or adding: fees raise a long's basis and lower a short's.
            let fee_adjust = match fill.side {
                Side::Buy => fill.fees,
                Side::Sell => -fill.fees,
            };
            let total_cost =
                position.avg_cost * position.quantity.abs() + fill.price * fill.quantity + fee_adjust;
            position.quantity += signed_qty;
            position.avg_cost = total_cost / position.quantity.abs();
            return None;
        }

        let close_qty = fill.quantity.min(position.quantity.abs());
        let per_share = if position.quantity > 0.0 {
            fill.price - position.avg_cost
        } else {
            position.avg_cost - fill.price
        };
        let pnl = per_share * close_qty - fill.fees;
        position.realized_pnl += pnl;

        let remainder = fill.quantity - close_qty;
        if remainder > EPSILON {
            // Flipped through zero: the rest opens the other way at the fill price.
            position.quantity = if signed_qty > 0.0 { remainder } else { -remainder };
            position.avg_cost = fill.price;
        } else {
            position.quantity += if signed_qty > 0.0 { close_qty } else { -close_qty };
            if position.is_flat() {
                position.quantity = 0.0;
                position.avg_cost = 0.0;
            }
        }

        Some(pnl)
    }

    #[must_use]
    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// All positions sorted by symbol, including flat ones.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        self.positions.values().cloned().collect()
    }

    #[must_use]
    pub fn total_realized(&self) -> f64 {
        self.positions.values().map(|p| p.realized_pnl).sum()
    }
}
