//! Terminal reports: portfolio performance and margin-interest estimates.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use trade_journal_core::{
    time_weighted_return, AppConfig, CashFlow, EquityPoint, MarginInterestEstimator, MarginTiers,
    PerformanceParams, ReportFormatter,
};
use trade_journal_data::{DateRange, DepositRecord, NetEquityRecord, Repositories};

use super::{find_user, open_database};

/// Arguments for the performance command.
#[derive(Args, Debug, Clone)]
pub struct PerformanceArgs {
    /// Account to report on
    #[arg(long)]
    pub email: String,

    /// First day (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

/// Arguments for the margin-interest command.
#[derive(Args, Debug, Clone)]
pub struct MarginInterestArgs {
    /// Outstanding margin loan in dollars
    #[arg(long)]
    pub loan: f64,

    /// First day accruing interest (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Day after the last accrual day (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,
}

/// Prints the time-weighted return report for one user.
///
/// # Errors
/// Returns an error if the user is unknown or there are fewer than two equity snapshots.
pub async fn run_performance(args: PerformanceArgs, config: AppConfig) -> Result<()> {
    let range = DateRange::new(args.from, args.to);
    range.validate()?;

    let db = open_database(&config).await?;
    let repos = Repositories::new(db.pool().clone());
    let user = find_user(&repos, &args.email).await?;

    let equity: Vec<EquityPoint> = repos
        .net_equity
        .list_by_owner(user.id, range)
        .await?
        .iter()
        .map(NetEquityRecord::to_point)
        .collect();
    let flows: Vec<CashFlow> = repos
        .deposits
        .list_by_owner(user.id, range)
        .await?
        .iter()
        .map(DepositRecord::to_cash_flow)
        .collect();
    db.close().await;

    tracing::debug!(snapshots = equity.len(), flows = flows.len(), "Computing performance");
    let report = time_weighted_return(&equity, &flows, PerformanceParams::from(&config.performance))?;

    println!("Performance for {}", user.email);
    print!("{}", ReportFormatter::performance(&report));
    Ok(())
}

/// Prints a margin-interest estimate using the stored Fed Funds schedule.
///
/// # Errors
/// Returns an error for an invalid tier table or date range, or a missing rate.
pub async fn run_margin_interest(args: MarginInterestArgs, config: AppConfig) -> Result<()> {
    let tiers = MarginTiers::try_from(&config.margin)?;

    let db = open_database(&config).await?;
    let schedule = Repositories::new(db.pool().clone()).fed_funds.schedule().await?;
    db.close().await;

    let estimator = MarginInterestEstimator::new(schedule, tiers, config.margin.day_count);
    let estimate = estimator.estimate(args.loan, args.start, args.end)?;

    print!("{}", ReportFormatter::interest(&estimate));
    Ok(())
}
