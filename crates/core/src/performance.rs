//! Time-weighted return (TWR) performance metrics.
//!
//! Daily net-equity snapshots are chained into a NAV ratio that neutralizes
//! deposits and withdrawals:
//!
//! ```text
//! r_t   = (E_t - F_t) / E_{t-1} - 1
//! NAV_t = NAV_{t-1} * (1 + r_t),   NAV_0 = 1
//! ```
//!
//! `F_t` is the net cash flow attributed to snapshot `t`: every flow dated after
//! the previous snapshot and on or before `t`. Flows on or before the first
//! snapshot are already part of the starting equity.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::PerformanceConfig;

/// Errors from performance calculations.
#[derive(Debug, Error, PartialEq)]
pub enum PerformanceError {
    /// Not enough equity snapshots to form a single daily return.
    #[error("insufficient data: need at least {required} equity records, found {found}")]
    InsufficientData { required: usize, found: usize },

    /// Every candidate day had a non-positive starting equity.
    #[error("no daily returns could be computed (previous equity was never positive)")]
    NoReturns,

    /// Parameters out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

/// A daily net-equity snapshot (or a benchmark close).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// An external cash flow. Positive for deposits, negative for withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PerformanceParams {
    /// Annual risk-free rate as a fraction.
    pub risk_free_rate: f64,
    pub trading_days_per_year: u32,
}

impl Default for PerformanceParams {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            trading_days_per_year: 252,
        }
    }
}

impl From<&PerformanceConfig> for PerformanceParams {
    fn from(config: &PerformanceConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            trading_days_per_year: config.trading_days_per_year,
        }
    }
}

/// One point of the NAV series.
#[derive(Debug, Clone, Serialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub equity: f64,
    /// Net flow attributed to this snapshot.
    pub flow: f64,
    /// `None` for the first point and for skipped days.
    pub daily_return: Option<f64>,
    pub nav: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawdownStats {
    pub max_drawdown: f64,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
    pub current_drawdown: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReturn {
    /// `YYYY-MM`
    pub month: String,
    pub return_pct: f64,
}

/// Full TWR report for one account (or one benchmark series).
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_equity: f64,
    pub end_equity: f64,
    pub total_deposits: f64,
    pub total_withdrawals: f64,
    pub net_flows: f64,
    /// `end_equity - start_equity - net_flows`
    pub profit: f64,
    pub cumulative_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: Option<f64>,
    pub drawdown: DrawdownStats,
    /// Number of daily returns that entered the statistics.
    pub return_days: usize,
    pub nav: Vec<NavPoint>,
    pub monthly_returns: Vec<MonthlyReturn>,
}

/// Computes the time-weighted return report for an equity series and its cash flows.
///
/// Snapshots may arrive unsorted; for duplicated dates the last value wins.
///
/// # Errors
/// Returns `InsufficientData` with fewer than two usable snapshots, `NoReturns`
/// when no day has a positive starting equity, and `InvalidParams` for a zero
/// trading-day count.
pub fn time_weighted_return(
    equity: &[EquityPoint],
    flows: &[CashFlow],
    params: PerformanceParams,
) -> Result<PerformanceReport, PerformanceError> {
    if params.trading_days_per_year == 0 {
        return Err(PerformanceError::InvalidParams(
            "trading_days_per_year must be positive".to_string(),
        ));
    }

    let series: BTreeMap<NaiveDate, f64> = equity
        .iter()
        .filter(|p| p.equity.is_finite())
        .map(|p| (p.date, p.equity))
        .collect();

    if series.len() < 2 {
        return Err(PerformanceError::InsufficientData {
            required: 2,
            found: series.len(),
        });
    }

    let mut flows_by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for flow in flows.iter().filter(|f| f.amount.is_finite()) {
        *flows_by_date.entry(flow.date).or_insert(0.0) += flow.amount;
    }

    let points: Vec<(NaiveDate, f64)> = series.into_iter().collect();
    let (start_date, start_equity) = points[0];
    let (end_date, end_equity) = points[points.len() - 1];

    let mut nav = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut peak_date = start_date;
    let mut drawdown = DrawdownStats::default();
    let mut returns = Vec::with_capacity(points.len() - 1);
    let mut nav_series = Vec::with_capacity(points.len());
    let mut total_deposits = 0.0;
    let mut total_withdrawals = 0.0;

    nav_series.push(NavPoint {
        date: start_date,
        equity: start_equity,
        flow: 0.0,
        daily_return: None,
        nav,
        drawdown: 0.0,
    });

    for window in points.windows(2) {
        let (prev_date, prev_equity) = window[0];
        let (date, value) = window[1];

        let flow: f64 = flows_by_date
            .range((
                std::ops::Bound::Excluded(prev_date),
                std::ops::Bound::Included(date),
            ))
            .map(|(_, amount)| *amount)
            .sum();

        for (_, amount) in flows_by_date.range((
            std::ops::Bound::Excluded(prev_date),
            std::ops::Bound::Included(date),
        )) {
            if *amount >= 0.0 {
                total_deposits += amount;
            } else {
                total_withdrawals += -amount;
            }
        }

        let daily_return = if prev_equity > 0.0 {
            let r = (value - flow) / prev_equity - 1.0;
            nav *= 1.0 + r;
            returns.push(r);
            Some(r)
        } else {
            None
        };

        if nav > peak {
            peak = nav;
            peak_date = date;
        }
        let dd = if peak > 0.0 { (peak - nav) / peak } else { 0.0 };
        if dd > drawdown.max_drawdown {
            drawdown.max_drawdown = dd;
            drawdown.peak_date = Some(peak_date);
            drawdown.trough_date = Some(date);
        }
        drawdown.current_drawdown = dd;

        nav_series.push(NavPoint {
            date,
            equity: value,
            flow,
            daily_return,
            nav,
            drawdown: dd,
        });
    }

    if returns.is_empty() {
        return Err(PerformanceError::NoReturns);
    }

    let days_per_year = f64::from(params.trading_days_per_year);
    #[allow(clippy::cast_precision_loss)]
    let n = returns.len() as f64;

    let cumulative_return = nav - 1.0;
    let annualized_return = if nav > 0.0 {
        nav.powf(days_per_year / n) - 1.0
    } else {
        -1.0
    };

    let daily_std = sample_std_dev(&returns);
    let annualized_volatility = daily_std * days_per_year.sqrt();
    let sharpe_ratio = if returns.len() >= 2 && annualized_volatility > 0.0 {
        Some((annualized_return - params.risk_free_rate) / annualized_volatility)
    } else {
        None
    };

    let net_flows = total_deposits - total_withdrawals;
    let monthly = monthly_returns(&nav_series);

    Ok(PerformanceReport {
        start_date,
        end_date,
        start_equity,
        end_equity,
        total_deposits,
        total_withdrawals,
        net_flows,
        profit: end_equity - start_equity - net_flows,
        cumulative_return,
        annualized_return,
        annualized_volatility,
        sharpe_ratio,
        drawdown,
        return_days: returns.len(),
        nav: nav_series,
        monthly_returns: monthly,
    })
}

/// Runs the same statistics over a price series with no external flows.
///
/// # Errors
/// Same conditions as [`time_weighted_return`].
pub fn benchmark_returns(
    prices: &[EquityPoint],
    params: PerformanceParams,
) -> Result<PerformanceReport, PerformanceError> {
    time_weighted_return(prices, &[], params)
}

/// Compounds a NAV series into calendar-month returns.
#[must_use]
pub fn monthly_returns(nav: &[NavPoint]) -> Vec<MonthlyReturn> {
    let Some(first) = nav.first() else {
        return Vec::new();
    };

    // Last NAV of each month, in order.
    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in nav {
        month_end.insert((point.date.year(), point.date.month()), point.nav);
    }

    let mut base = first.nav;
    month_end
        .into_iter()
        .map(|((year, month), end_nav)| {
            let return_pct = if base > 0.0 { end_nav / base - 1.0 } else { 0.0 };
            base = end_nav;
            MonthlyReturn {
                month: format!("{year:04}-{month:02}"),
                return_pct,
            }
        })
        .collect()
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(d: NaiveDate, equity: f64) -> EquityPoint {
        EquityPoint { date: d, equity }
    }

    #[test]
    fn test_insufficient_data() {
        let err = time_weighted_return(
            &[point(date(2024, 1, 2), 1000.0)],
            &[],
            PerformanceParams::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PerformanceError::InsufficientData {
                required: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_deposit_without_market_move_is_zero_return() {
        let equity = [
            point(date(2024, 1, 2), 10_000.0),
            point(date(2024, 1, 3), 15_000.0),
        ];
        let flows = [CashFlow {
            date: date(2024, 1, 3),
            amount: 5_000.0,
        }];

        let report = time_weighted_return(&equity, &flows, PerformanceParams::default()).unwrap();
        assert!(report.cumulative_return.abs() < 1e-12);
        assert!((report.total_deposits - 5_000.0).abs() < 1e-9);
        assert!(report.profit.abs() < 1e-9);
    }

    #[test]
    fn test_withdrawal_is_neutralized() {
        let equity = [
            point(date(2024, 1, 2), 10_000.0),
            point(date(2024, 1, 3), 8_800.0),
        ];
        // Withdrew 2000, so the account actually gained 800 on 10k.
        let flows = [CashFlow {
            date: date(2024, 1, 3),
            amount: -2_000.0,
        }];

        let report = time_weighted_return(&equity, &flows, PerformanceParams::default()).unwrap();
        assert!((report.cumulative_return - 0.08).abs() < 1e-12);
        assert!((report.total_withdrawals - 2_000.0).abs() < 1e-9);
        assert!((report.profit - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_flows_between_snapshots_attach_to_next_snapshot() {
        let equity = [
            point(date(2024, 1, 5), 1_000.0),
            point(date(2024, 1, 8), 2_100.0),
        ];
        // Weekend deposit.
        let flows = [CashFlow {
            date: date(2024, 1, 6),
            amount: 1_000.0,
        }];

        let report = time_weighted_return(&equity, &flows, PerformanceParams::default()).unwrap();
        assert!((report.cumulative_return - 0.1).abs() < 1e-12);
        assert!((report.nav[1].flow - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_flows_before_start_are_ignored() {
        let equity = [
            point(date(2024, 1, 2), 1_000.0),
            point(date(2024, 1, 3), 1_010.0),
        ];
        let flows = [CashFlow {
            date: date(2024, 1, 2),
            amount: 1_000.0,
        }];

        let report = time_weighted_return(&equity, &flows, PerformanceParams::default()).unwrap();
        assert!((report.cumulative_return - 0.01).abs() < 1e-12);
        assert!(report.net_flows.abs() < 1e-12);
    }

    #[test]
    fn test_chained_returns_and_drawdown() {
        let equity = [
            point(date(2024, 1, 2), 100.0),
            point(date(2024, 1, 3), 110.0),
            point(date(2024, 1, 4), 99.0),
            point(date(2024, 1, 5), 104.5),
        ];

        let report = time_weighted_return(&equity, &[], PerformanceParams::default()).unwrap();
        assert_eq!(report.return_days, 3);
        assert!((report.cumulative_return - 0.045).abs() < 1e-12);
        // Peak 1.10 on Jan 3, trough 0.99 on Jan 4.
        assert!((report.drawdown.max_drawdown - 0.1).abs() < 1e-12);
        assert_eq!(report.drawdown.peak_date, Some(date(2024, 1, 3)));
        assert_eq!(report.drawdown.trough_date, Some(date(2024, 1, 4)));
        assert!((report.drawdown.current_drawdown - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_input_and_duplicate_dates() {
        let equity = [
            point(date(2024, 1, 3), 999.0),
            point(date(2024, 1, 2), 100.0),
            point(date(2024, 1, 3), 120.0),
        ];

        let report = time_weighted_return(&equity, &[], PerformanceParams::default()).unwrap();
        assert_eq!(report.start_date, date(2024, 1, 2));
        assert!((report.end_equity - 120.0).abs() < 1e-12);
        assert!((report.cumulative_return - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_previous_equity_skips_day() {
        let equity = [
            point(date(2024, 1, 2), 0.0),
            point(date(2024, 1, 3), 500.0),
            point(date(2024, 1, 4), 550.0),
        ];

        let report = time_weighted_return(&equity, &[], PerformanceParams::default()).unwrap();
        assert_eq!(report.return_days, 1);
        assert!(report.nav[1].daily_return.is_none());
        assert!((report.cumulative_return - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_all_days_skipped_is_error() {
        let equity = [point(date(2024, 1, 2), 0.0), point(date(2024, 1, 3), 0.0)];
        let err = time_weighted_return(&equity, &[], PerformanceParams::default()).unwrap_err();
        assert_eq!(err, PerformanceError::NoReturns);
    }

    #[test]
    fn test_sharpe_and_volatility() {
        let equity = [
            point(date(2024, 1, 2), 100.0),
            point(date(2024, 1, 3), 101.0),
            point(date(2024, 1, 4), 100.0),
            point(date(2024, 1, 5), 102.0),
        ];
        let params = PerformanceParams {
            risk_free_rate: 0.02,
            trading_days_per_year: 252,
        };

        let report = time_weighted_return(&equity, &[], params).unwrap();
        let returns: Vec<f64> = report.nav.iter().filter_map(|p| p.daily_return).collect();
        let std = sample_std_dev(&returns);
        let expected_vol = std * 252.0_f64.sqrt();
        assert!((report.annualized_volatility - expected_vol).abs() < 1e-12);

        let expected_annual = 1.02_f64.powf(252.0 / 3.0) - 1.0;
        assert!((report.annualized_return - expected_annual).abs() < 1e-9);

        let sharpe = report.sharpe_ratio.unwrap();
        assert!((sharpe - (expected_annual - 0.02) / expected_vol).abs() < 1e-9);
    }

    #[test]
    fn test_single_return_has_no_sharpe() {
        let equity = [
            point(date(2024, 1, 2), 100.0),
            point(date(2024, 1, 3), 101.0),
        ];
        let report = time_weighted_return(&equity, &[], PerformanceParams::default()).unwrap();
        assert!(report.sharpe_ratio.is_none());
        assert!(report.annualized_volatility.abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_trading_days_rejected() {
        let params = PerformanceParams {
            risk_free_rate: 0.0,
            trading_days_per_year: 0,
        };
        let err = time_weighted_return(&[], &[], params).unwrap_err();
        assert!(matches!(err, PerformanceError::InvalidParams(_)));
    }

    #[test]
    fn test_monthly_returns_compound() {
        let equity = [
            point(date(2024, 1, 30), 100.0),
            point(date(2024, 1, 31), 110.0),
            point(date(2024, 2, 1), 121.0),
            point(date(2024, 2, 29), 99.0),
        ];

        let report = time_weighted_return(&equity, &[], PerformanceParams::default()).unwrap();
        let months = &report.monthly_returns;
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-01");
        assert!((months[0].return_pct - 0.1).abs() < 1e-12);
        assert_eq!(months[1].month, "2024-02");
        assert!((months[1].return_pct - (0.99 / 1.1 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_benchmark_has_no_flows() {
        let prices = [
            point(date(2024, 1, 2), 470.0),
            point(date(2024, 1, 3), 475.0),
        ];
        let report = benchmark_returns(&prices, PerformanceParams::default()).unwrap();
        assert!(report.net_flows.abs() < f64::EPSILON);
        assert!((report.cumulative_return - (475.0 / 470.0 - 1.0)).abs() < 1e-12);
    }
}
