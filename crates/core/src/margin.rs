//! Margin-interest estimation.
//!
//! The broker charges the monthly effective federal funds rate plus a
//! loan-size dependent spread, blended across tiers, as simple interest
//! accrued per calendar day on an actual/`day_count` basis.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::MarginConfig;

#[derive(Debug, Error, PartialEq)]
pub enum MarginError {
    /// No benchmark rate exists for the month or any month before it.
    #[error("no federal funds rate available for {0} or earlier")]
    NoRate(String),

    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid margin tiers: {0}")]
    InvalidTiers(String),
}

/// Monthly federal funds rates, annual percent keyed by `(year, month)`.
#[derive(Debug, Clone, Default)]
pub struct FedFundsSchedule {
    rates: BTreeMap<(i32, u32), f64>,
}

impl FedFundsSchedule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schedule from `YYYY-MM` keyed rates, ignoring malformed months.
    pub fn from_months<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut schedule = Self::new();
        for (month, rate) in entries {
            if let Some(key) = parse_month(month) {
                schedule.rates.insert(key, rate);
            } else {
                tracing::warn!(month, "Skipping malformed fed funds month");
            }
        }
        schedule
    }

    pub fn insert(&mut self, year: i32, month: u32, rate: f64) {
        self.rates.insert((year, month), rate);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate for the month containing `date`, falling back to the latest earlier month.
    ///
    /// # Errors
    /// Returns `NoRate` when the schedule has nothing on or before that month.
    pub fn rate_for(&self, date: NaiveDate) -> Result<f64, MarginError> {
        let key = (date.year(), date.month());
        self.rates
            .range(..=key)
            .next_back()
            .map(|(_, rate)| *rate)
            .ok_or_else(|| MarginError::NoRate(format!("{:04}-{:02}", key.0, key.1)))
    }
}

/// Parses `YYYY-MM` into `(year, month)`.
#[must_use]
pub fn parse_month(month: &str) -> Option<(i32, u32)> {
    let (year, month) = month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginTier {
    /// Upper bound of the band; `None` for the top band.
    pub up_to: Option<f64>,
    /// Spread in percent over the benchmark.
    pub spread: f64,
}

#[derive(Debug, Clone)]
pub struct MarginTiers {
    tiers: Vec<MarginTier>,
}

impl MarginTiers {
    /// # Errors
    /// Returns `InvalidTiers` when the list is empty, bounds are not increasing,
    /// or an unbounded tier is not last.
    pub fn new(tiers: Vec<MarginTier>) -> Result<Self, MarginError> {
        if tiers.is_empty() {
            return Err(MarginError::InvalidTiers("at least one tier required".into()));
        }
        let mut previous = 0.0;
        for (i, tier) in tiers.iter().enumerate() {
            match tier.up_to {
                Some(bound) if bound <= previous => {
                    return Err(MarginError::InvalidTiers(format!(
                        "tier {i} bound {bound} does not exceed {previous}"
                    )));
                }
                Some(bound) => previous = bound,
                None if i + 1 != tiers.len() => {
                    return Err(MarginError::InvalidTiers(
                        "only the last tier may be unbounded".into(),
                    ));
                }
                None => {}
            }
        }
        Ok(Self { tiers })
    }

    /// Annual percent charged on `loan`, blending benchmark + spread across bands.
    #[must_use]
    pub fn blended_rate(&self, loan: f64, benchmark: f64) -> f64 {
        if loan <= 0.0 {
            return 0.0;
        }

        let mut lower = 0.0;
        let mut weighted = 0.0;
        let mut last_spread = 0.0;
        for tier in &self.tiers {
            last_spread = tier.spread;
            let upper = tier.up_to.unwrap_or(f64::INFINITY);
            let portion = loan.min(upper) - lower;
            if portion <= 0.0 {
                break;
            }
            weighted += portion * (benchmark + tier.spread);
            lower = upper;
        }
        // Loan larger than the last bounded tier.
        if loan > lower {
            weighted += (loan - lower) * (benchmark + last_spread);
        }

        weighted / loan
    }
}

impl Default for MarginTiers {
    fn default() -> Self {
        Self::try_from(&MarginConfig::default()).unwrap_or_else(|_| Self {
            tiers: vec![MarginTier {
                up_to: None,
                spread: 1.5,
            }],
        })
    }
}

impl TryFrom<&MarginConfig> for MarginTiers {
    type Error = MarginError;

    fn try_from(config: &MarginConfig) -> Result<Self, Self::Error> {
        Self::new(
            config
                .tiers
                .iter()
                .map(|t| MarginTier {
                    up_to: t.up_to,
                    spread: t.spread,
                })
                .collect(),
        )
    }
}

/// Simple interest for one day.
#[must_use]
pub fn daily_interest(loan: f64, annual_pct: f64, day_count: u32) -> f64 {
    if loan <= 0.0 || day_count == 0 {
        return 0.0;
    }
    loan * annual_pct / 100.0 / f64::from(day_count)
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyInterest {
    pub month: String,
    pub days: u32,
    pub rate: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterestEstimate {
    pub loan: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
    pub total: f64,
    /// Day-weighted average annual percent.
    pub average_rate: f64,
    pub by_month: Vec<MonthlyInterest>,
}

pub struct MarginInterestEstimator {
    schedule: FedFundsSchedule,
    tiers: MarginTiers,
    day_count: u32,
}

impl MarginInterestEstimator {
    #[must_use]
    pub fn new(schedule: FedFundsSchedule, tiers: MarginTiers, day_count: u32) -> Self {
        Self {
            schedule,
            tiers,
            day_count,
        }
    }

    /// Estimates interest on a constant `loan` for each day in `[start, end)`.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `end < start`, or `NoRate` if some day has no benchmark.
    pub fn estimate(
        &self,
        loan: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InterestEstimate, MarginError> {
        if end < start {
            return Err(MarginError::InvalidRange { start, end });
        }

        let mut by_month: Vec<MonthlyInterest> = Vec::new();
        let mut total = 0.0;
        let mut rate_days = 0.0;
        let mut days = 0_u32;

        let mut day = start;
        while day < end {
            let annual = if loan > 0.0 {
                self.tiers.blended_rate(loan, self.schedule.rate_for(day)?)
            } else {
                0.0
            };
            let interest = daily_interest(loan, annual, self.day_count);
            let month = format!("{:04}-{:02}", day.year(), day.month());

            match by_month.last_mut() {
                Some(entry) if entry.month == month => {
                    entry.days += 1;
                    entry.interest += interest;
                }
                _ => by_month.push(MonthlyInterest {
                    month,
                    days: 1,
                    rate: annual,
                    interest,
                }),
            }

            total += interest;
            rate_days += annual;
            days += 1;
            day += Duration::days(1);
        }

        let average_rate = if days > 0 {
            rate_days / f64::from(days)
        } else {
            0.0
        };

        Ok(InterestEstimate {
            loan,
            start,
            end,
            days,
            total,
            average_rate,
            by_month,
        })
    }
}
